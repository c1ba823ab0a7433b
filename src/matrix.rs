use crate::basis::Basis;
use crate::error::{KmerError, Result};
use crate::types::Matrix;
use crate::vectorize::BatchVectors;
use log::debug;
use ndarray::{ArrayView2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Converts counts into presence/absence (1.0 where the value is positive)
pub fn binarize(matrix: ArrayView2<f64>) -> Matrix {
    matrix.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 })
}

/// What each cell of a built matrix holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ValueMode {
    #[default]
    Presence,
    Counts,
}

/// Occurrence band a k-mer column must fall in to be kept.
///
/// Disabled by default, in which case every column survives. Totals are
/// taken over raw counts, before any binarization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub enabled: bool,
    pub min_filter: usize,
    pub max_filter: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            enabled: false,
            min_filter: 1,
            max_filter: usize::MAX,
        }
    }
}

impl FilterConfig {
    pub fn band(min_filter: usize, max_filter: usize) -> Self {
        FilterConfig {
            enabled: true,
            min_filter,
            max_filter,
        }
    }

    fn keeps(&self, total: usize) -> bool {
        !self.enabled || (self.min_filter..=self.max_filter).contains(&total)
    }
}

/// Dense sequences × k-mers matrix with its row identifiers and column order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub ids: Vec<String>,
    pub kmers: Basis,
    pub values: Matrix,
}

impl FeatureMatrix {
    pub fn n_sequences(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_kmers(&self) -> usize {
        self.values.ncols()
    }

    /// K-mers as rows and sequences as columns, the layout scoring expects
    pub fn kmer_major(&self) -> Matrix {
        self.values.t().to_owned()
    }

    /// Emitter-friendly frame: an `id` column followed by one column per k-mer
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.n_kmers() + 1);
        columns.push(Column::new("id".into(), self.ids.clone()));
        for (kmer, values) in self.kmers.iter().zip(self.values.axis_iter(Axis(1))) {
            columns.push(Column::new(kmer.into(), values.to_vec()));
        }
        DataFrame::new(columns).map_err(|e| KmerError::Data(e.to_string()))
    }

    /// Pairwise sequence similarity or distance
    pub fn pairwise(&self, metric: Metric) -> Matrix {
        pairwise(self.values.view(), metric)
    }
}

/// Merges ragged per-sequence k-mer collections into one dense matrix.
///
/// Runs in two passes: the sorted union of all k-mers becomes the column
/// order, then each sequence fills its row through hashed lookups into that
/// union.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureMatrixBuilder {
    mode: ValueMode,
    filter: FilterConfig,
}

impl FeatureMatrixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ValueMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_filter(mut self, filter: FilterConfig) -> Self {
        self.filter = filter;
        self
    }

    /// Builds the matrix (sequences × union k-mers) and the union order.
    ///
    /// A k-mer repeated within one collection adds to its count in
    /// [`ValueMode::Counts`] and is simply present in [`ValueMode::Presence`].
    ///
    /// # Errors
    /// * `KmerError::EmptyFeatureSpace` - If an enabled filter removes every k-mer
    ///
    /// # Example
    /// ```
    /// use kmer_features::matrix::FeatureMatrixBuilder;
    ///
    /// let (matrix, kmers) = FeatureMatrixBuilder::new()
    ///     .build(&[vec!["AC", "AA"], vec!["CA"]])
    ///     .unwrap();
    /// assert_eq!(kmers.kmers(), ["AA", "AC", "CA"]);
    /// assert_eq!(matrix.row(1).to_vec(), vec![0.0, 0.0, 1.0]);
    /// ```
    pub fn build<S: AsRef<str>>(&self, collections: &[Vec<S>]) -> Result<(Matrix, Basis)> {
        let union: BTreeSet<&str> = collections
            .iter()
            .flat_map(|kmers| kmers.iter().map(AsRef::<str>::as_ref))
            .collect();
        let union = Basis::from_kmers(union);

        let mut counts = Matrix::zeros((collections.len(), union.len()));
        for (row, kmers) in collections.iter().enumerate() {
            for kmer in kmers {
                if let Some(column) = union.position(kmer.as_ref()) {
                    counts[[row, column]] += 1.0;
                }
            }
        }
        debug!(
            "built {} x {} feature matrix",
            collections.len(),
            union.len()
        );

        let (counts, kmers) = self.apply_filter(counts, union)?;
        let values = match self.mode {
            ValueMode::Presence => binarize(counts.view()),
            ValueMode::Counts => counts,
        };
        Ok((values, kmers))
    }

    /// Builds a [`FeatureMatrix`] with row identifiers
    ///
    /// # Errors
    /// * `KmerError::ShapeMismatch` - If `ids` and `collections` differ in length
    /// * `KmerError::EmptyFeatureSpace` - If an enabled filter removes every k-mer
    pub fn build_with_ids<S: AsRef<str>>(
        &self,
        ids: Vec<String>,
        collections: &[Vec<S>],
    ) -> Result<FeatureMatrix> {
        if ids.len() != collections.len() {
            return Err(KmerError::shape_mismatch(
                "identifiers vs k-mer collections",
                collections.len(),
                ids.len(),
            ));
        }
        let (values, kmers) = self.build(collections)?;
        Ok(FeatureMatrix { ids, kmers, values })
    }

    /// Builds from vectorized sequences, expanding each k-mer by its count
    pub fn from_batch(&self, batch: &BatchVectors) -> Result<FeatureMatrix> {
        let ids = batch.vectors.iter().map(|(id, _)| id.clone()).collect();
        let collections: Vec<Vec<&str>> = batch
            .vectors
            .iter()
            .map(|(_, vector)| {
                vector
                    .counts
                    .iter()
                    .flat_map(|(kmer, &count)| std::iter::repeat(kmer.as_str()).take(count))
                    .collect()
            })
            .collect();
        self.build_with_ids(ids, &collections)
    }

    fn apply_filter(&self, counts: Matrix, kmers: Basis) -> Result<(Matrix, Basis)> {
        if !self.filter.enabled || kmers.is_empty() {
            return Ok((counts, kmers));
        }

        let totals = counts.sum_axis(Axis(0));
        let keep: Vec<usize> = totals
            .iter()
            .enumerate()
            .filter(|(_, &total)| self.filter.keeps(total as usize))
            .map(|(column, _)| column)
            .collect();
        if keep.is_empty() {
            return Err(KmerError::EmptyFeatureSpace);
        }
        debug!(
            "occurrence filter [{}, {}] kept {} of {} k-mers",
            self.filter.min_filter,
            self.filter.max_filter,
            keep.len(),
            kmers.len()
        );

        let filtered = counts.select(Axis(1), &keep);
        let kmers = Basis::from_kmers(keep.iter().filter_map(|&c| kmers.get(c)));
        Ok((filtered, kmers))
    }
}

/// Row-wise comparison used to hand a similarity/distance matrix to clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Shared over combined presence on binarized rows (similarity)
    Jaccard,
    /// One minus the Hamming fraction on binarized rows (similarity)
    SimpleMatching,
    /// Fraction of differing presence calls (distance)
    Hamming,
    /// Euclidean distance on raw values
    Euclidean,
}

impl FromStr for Metric {
    type Err = KmerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jaccard" => Ok(Metric::Jaccard),
            "simple_matching" | "matching" => Ok(Metric::SimpleMatching),
            "hamming" => Ok(Metric::Hamming),
            "euclidean" => Ok(Metric::Euclidean),
            _ => Err(KmerError::invalid_parameter(
                "metric",
                s,
                "expected one of jaccard, simple_matching, hamming, euclidean",
            )),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Jaccard => "jaccard",
            Metric::SimpleMatching => "simple_matching",
            Metric::Hamming => "hamming",
            Metric::Euclidean => "euclidean",
        };
        write!(f, "{}", name)
    }
}

/// Square matrix of `metric` between every pair of rows of `values`
pub fn pairwise(values: ArrayView2<f64>, metric: Metric) -> Matrix {
    let n = values.nrows();
    let width = values.ncols() as f64;
    let presence = binarize(values);
    let mut result = Matrix::zeros((n, n));

    for i in 0..n {
        for j in i..n {
            let value = match metric {
                Metric::Jaccard => {
                    let (a, b) = (presence.row(i), presence.row(j));
                    let shared = a.dot(&b);
                    let combined = a.iter().zip(b.iter()).filter(|(x, y)| **x + **y > 0.0).count();
                    if combined == 0 {
                        1.0
                    } else {
                        shared / combined as f64
                    }
                }
                Metric::SimpleMatching | Metric::Hamming => {
                    let differing = presence
                        .row(i)
                        .iter()
                        .zip(presence.row(j).iter())
                        .filter(|(x, y)| x != y)
                        .count() as f64;
                    let fraction = if width > 0.0 { differing / width } else { 0.0 };
                    if metric == Metric::Hamming {
                        fraction
                    } else {
                        1.0 - fraction
                    }
                }
                Metric::Euclidean => values
                    .row(i)
                    .iter()
                    .zip(values.row(j).iter())
                    .map(|(x, y)| (x - y).powi(2))
                    .sum::<f64>()
                    .sqrt(),
            };
            result[[i, j]] = value;
            result[[j, i]] = value;
        }
    }
    result
}
