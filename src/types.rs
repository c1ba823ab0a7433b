use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Sparse k-mer counts for a single sequence, keyed by k-mer string
pub type KmerCounts = HashMap<String, usize>;

/// Dense vector positionally aligned to some basis
pub type DenseVector = Array1<f64>;

/// Dense numeric matrix handed to scoring and to external consumers
pub type Matrix = Array2<f64>;

/// A sequence identifier paired with its residues
pub type SequenceRecord = (String, String);
