use crate::basis::Basis;
use crate::error::{KmerError, Result};
use crate::types::{DenseVector, Matrix};
use log::debug;
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value written into target slots whose k-mer is absent from the source order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Absent k-mers count as zero
    #[default]
    Zero,
    /// Absent k-mers are marked with a caller-chosen value (e.g. NaN)
    Marker(f64),
}

impl FillPolicy {
    pub fn value(&self) -> f64 {
        match self {
            FillPolicy::Zero => 0.0,
            FillPolicy::Marker(marker) => *marker,
        }
    }
}

/// Reindexes vectors built over arbitrary k-mer orders onto one fitted basis.
///
/// Fit once with the reference basis, then transform any number of vectors or
/// matrices built from other (partial, reordered or larger) bases. Slot `i` of
/// every output corresponds to `basis[i]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasisAligner {
    basis: Basis,
    fill: FillPolicy,
}

impl BasisAligner {
    pub fn fit(basis: Basis) -> Self {
        BasisAligner {
            basis,
            fill: FillPolicy::default(),
        }
    }

    pub fn with_fill(mut self, fill: FillPolicy) -> Self {
        self.fill = fill;
        self
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn fill(&self) -> FillPolicy {
        self.fill
    }

    /// Position in `source_order` of each fitted k-mer, `None` when absent
    pub fn index_map<S: AsRef<str>>(&self, source_order: &[S]) -> Vec<Option<usize>> {
        let mut source: HashMap<&str, usize> = HashMap::with_capacity(source_order.len());
        for (position, kmer) in source_order.iter().enumerate() {
            source.entry(kmer.as_ref()).or_insert(position);
        }
        self.basis
            .iter()
            .map(|kmer| source.get(kmer).copied())
            .collect()
    }

    /// Aligns one vector ordered by `source_order` to the fitted basis.
    ///
    /// # Errors
    /// * `KmerError::ShapeMismatch` - If the vector and `source_order` differ in length
    pub fn transform<S: AsRef<str>>(
        &self,
        vector: ArrayView1<f64>,
        source_order: &[S],
    ) -> Result<DenseVector> {
        if vector.len() != source_order.len() {
            return Err(KmerError::shape_mismatch(
                "vector vs source order",
                source_order.len(),
                vector.len(),
            ));
        }
        let fill = self.fill.value();
        Ok(self
            .index_map(source_order)
            .into_iter()
            .map(|position| position.map_or(fill, |p| vector[p]))
            .collect())
    }

    /// Aligns a matrix whose k-mers lie along `kmer_axis`.
    ///
    /// The other axis (sequences) is kept as is.
    ///
    /// # Errors
    /// * `KmerError::InvalidParameter` - If `kmer_axis` is not 0 or 1
    /// * `KmerError::ShapeMismatch` - If the k-mer axis length differs from `source_order`
    pub fn transform_matrix<S: AsRef<str>>(
        &self,
        matrix: ArrayView2<f64>,
        source_order: &[S],
        kmer_axis: Axis,
    ) -> Result<Matrix> {
        if kmer_axis.index() > 1 {
            return Err(KmerError::invalid_parameter(
                "kmer_axis",
                kmer_axis.index(),
                "a matrix only has axes 0 and 1",
            ));
        }
        let actual = matrix.len_of(kmer_axis);
        if actual != source_order.len() {
            return Err(KmerError::shape_mismatch(
                "matrix k-mer axis vs source order",
                source_order.len(),
                actual,
            ));
        }

        let mut shape = [matrix.nrows(), matrix.ncols()];
        shape[kmer_axis.index()] = self.basis.len();
        let mut aligned = Matrix::from_elem(shape, self.fill.value());

        let index_map = self.index_map(source_order);
        let missing = index_map.iter().filter(|p| p.is_none()).count();
        for (target, position) in index_map.into_iter().enumerate() {
            if let Some(source) = position {
                aligned
                    .index_axis_mut(kmer_axis, target)
                    .assign(&matrix.index_axis(kmer_axis, source));
            }
        }
        debug!(
            "aligned {} source k-mers onto {} basis k-mers ({} filled)",
            source_order.len(),
            self.basis.len(),
            missing
        );
        Ok(aligned)
    }
}

/// Zero-filling alignment of `vector` (ordered by `source_order`) onto `target`
pub fn align<S: AsRef<str>>(
    vector: ArrayView1<f64>,
    source_order: &[S],
    target: &Basis,
) -> Result<DenseVector> {
    BasisAligner::fit(target.clone()).transform(vector, source_order)
}
