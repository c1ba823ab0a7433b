use crate::align::BasisAligner;
use crate::basis::Basis;
use crate::error::{KmerError, Result};
use crate::matrix::binarize;
use crate::types::DenseVector;
use log::debug;
use ndarray::{ArrayView1, ArrayView2, Axis};
use polars::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How in-class probability is contrasted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScoreMethod {
    /// P(class) - weight * sum of P(other classes)
    #[default]
    Default,
    /// P(class) - P(background)
    BgOnly,
    /// P(class) - P(background) - weight * sum of P(other classes)
    Both,
}

impl ScoreMethod {
    pub fn needs_background(&self) -> bool {
        matches!(self, ScoreMethod::BgOnly | ScoreMethod::Both)
    }
}

impl FromStr for ScoreMethod {
    type Err = KmerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "default" => Ok(ScoreMethod::Default),
            "bg_only" => Ok(ScoreMethod::BgOnly),
            "both" => Ok(ScoreMethod::Both),
            _ => Err(KmerError::invalid_parameter(
                "method",
                s,
                "expected one of default, bg_only, both",
            )),
        }
    }
}

impl fmt::Display for ScoreMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScoreMethod::Default => "default",
            ScoreMethod::BgOnly => "bg_only",
            ScoreMethod::Both => "both",
        };
        write!(f, "{}", name)
    }
}

/// Per-k-mer results for one class label, aligned to the table's k-mer order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub label: String,
    pub n_sequences: usize,
    pub count: Vec<usize>,
    pub probability: Vec<f64>,
    pub score: Vec<f64>,
}

/// Scores for every distinct label, sorted by label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub kmers: Vec<String>,
    pub classes: Vec<ClassScores>,
}

impl ScoreTable {
    pub fn get(&self, label: &str) -> Option<&ClassScores> {
        self.classes.iter().find(|c| c.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.label.as_str()).collect()
    }

    /// Long form with one row per (label, k-mer):
    /// `label`, `kmer`, `count`, `probability`, `score`
    pub fn to_long_dataframe(&self) -> Result<DataFrame> {
        let rows = self.kmers.len() * self.classes.len();
        let mut labels = Vec::with_capacity(rows);
        let mut kmers = Vec::with_capacity(rows);
        let mut counts = Vec::with_capacity(rows);
        let mut probabilities = Vec::with_capacity(rows);
        let mut scores = Vec::with_capacity(rows);

        for class in &self.classes {
            for (i, kmer) in self.kmers.iter().enumerate() {
                labels.push(class.label.clone());
                kmers.push(kmer.clone());
                counts.push(class.count[i] as u64);
                probabilities.push(class.probability[i]);
                scores.push(class.score[i]);
            }
        }

        DataFrame::new(vec![
            Column::new("label".into(), labels),
            Column::new("kmer".into(), kmers),
            Column::new("count".into(), counts),
            Column::new("probability".into(), probabilities),
            Column::new("score".into(), scores),
        ])
        .map_err(|e| KmerError::Data(e.to_string()))
    }
}

/// Presence fraction of each k-mer (row) across background sequences (columns)
pub fn background_probability(background: ArrayView2<f64>) -> DenseVector {
    let n = background.ncols();
    if n == 0 {
        return DenseVector::zeros(background.nrows());
    }
    binarize(background).sum_axis(Axis(1)) / n as f64
}

/// Scores k-mers for how well they discriminate each class from the others
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassProbabilityScorer {
    method: ScoreMethod,
}

impl ClassProbabilityScorer {
    pub fn new(method: ScoreMethod) -> Self {
        ClassProbabilityScorer { method }
    }

    pub fn method(&self) -> ScoreMethod {
        self.method
    }

    /// Computes presence, probability and score per label.
    ///
    /// The matrix is binarized first, so raw counts and presence calls score
    /// the same. For each label with `n` sequences, probability is the number of
    /// its sequences containing the k-mer divided by `n`. The contrast weight is
    /// `1 / (labels - 1)`.
    ///
    /// # Arguments
    /// * `feature_matrix` - K-mers as rows, sequences as columns
    /// * `labels` - One class label per column
    /// * `kmers` - K-mer identifiers per row; row indices are used when `None`
    /// * `background` - Background probability per row, required by `bg_only` and `both`
    ///
    /// # Errors
    /// * `KmerError::MissingBackground` - If the method needs a background and none is given
    /// * `KmerError::ShapeMismatch` - If labels, k-mers or background disagree with the matrix
    /// * `KmerError::InsufficientClasses` - If fewer than two distinct labels are present
    pub fn score<L: AsRef<str> + Sync>(
        &self,
        feature_matrix: ArrayView2<f64>,
        labels: &[L],
        kmers: Option<&[String]>,
        background: Option<ArrayView1<f64>>,
    ) -> Result<ScoreTable> {
        let (n_kmers, n_sequences) = feature_matrix.dim();

        if self.method.needs_background() && background.is_none() {
            return Err(KmerError::MissingBackground(self.method.to_string()));
        }
        if labels.len() != n_sequences {
            return Err(KmerError::shape_mismatch(
                "labels vs feature matrix columns",
                n_sequences,
                labels.len(),
            ));
        }
        let kmers: Vec<String> = match kmers {
            Some(kmers) if kmers.len() != n_kmers => {
                return Err(KmerError::shape_mismatch(
                    "k-mer ids vs feature matrix rows",
                    n_kmers,
                    kmers.len(),
                ))
            }
            Some(kmers) => kmers.to_vec(),
            None => (0..n_kmers).map(|i| i.to_string()).collect(),
        };
        let background = match background {
            Some(bg) if self.method.needs_background() => {
                if bg.len() != n_kmers {
                    return Err(KmerError::shape_mismatch(
                        "background vs feature matrix rows",
                        n_kmers,
                        bg.len(),
                    ));
                }
                Some(bg)
            }
            _ => None,
        };

        let distinct: Vec<&str> = labels
            .iter()
            .map(AsRef::<str>::as_ref)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if distinct.len() < 2 {
            return Err(KmerError::InsufficientClasses(distinct.len()));
        }

        let presence = binarize(feature_matrix);
        let per_label: Vec<(String, usize, Vec<usize>, DenseVector)> = distinct
            .par_iter()
            .map(|&label| {
                let columns: Vec<usize> = labels
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| AsRef::<str>::as_ref(*l) == label)
                    .map(|(i, _)| i)
                    .collect();
                let count = presence.select(Axis(1), &columns).sum_axis(Axis(1));
                let probability = &count / columns.len() as f64;
                let count = count.iter().map(|&c| c as usize).collect();
                (label.to_string(), columns.len(), count, probability)
            })
            .collect();

        let weight = 1.0 / (distinct.len() - 1) as f64;
        let total_probability = per_label
            .iter()
            .fold(DenseVector::zeros(n_kmers), |acc, (_, _, _, p)| acc + p);

        let classes = per_label
            .into_iter()
            .map(|(label, n, count, probability)| {
                let others = &total_probability - &probability;
                let mut score = match self.method {
                    ScoreMethod::Default | ScoreMethod::Both => &probability - &(others * weight),
                    ScoreMethod::BgOnly => probability.clone(),
                };
                if let Some(bg) = background {
                    score = score - bg;
                }
                ClassScores {
                    label,
                    n_sequences: n,
                    count,
                    probability: probability.to_vec(),
                    score: score.to_vec(),
                }
            })
            .collect();

        debug!(
            "scored {} k-mers over {} sequences in {} classes ({})",
            n_kmers,
            n_sequences,
            distinct.len(),
            self.method
        );
        Ok(ScoreTable { kmers, classes })
    }
}

/// Weights each binarized column by per-k-mer scores and sums it.
///
/// Returns one total per sequence (column), a simple linear classifier score.
///
/// # Errors
/// * `KmerError::ShapeMismatch` - If `scores` does not have one entry per matrix row
pub fn apply_scores(feature_matrix: ArrayView2<f64>, scores: ArrayView1<f64>) -> Result<DenseVector> {
    if scores.len() != feature_matrix.nrows() {
        return Err(KmerError::shape_mismatch(
            "scores vs feature matrix rows",
            feature_matrix.nrows(),
            scores.len(),
        ));
    }
    Ok(binarize(feature_matrix).t().dot(&scores))
}

/// Like [`apply_scores`], after first aligning the matrix rows (ordered by
/// `matrix_kmers`) onto the basis the scores were fitted on. K-mers the
/// matrix never saw contribute nothing.
pub fn apply_scores_aligned<S: AsRef<str>>(
    feature_matrix: ArrayView2<f64>,
    matrix_kmers: &[S],
    scores: ArrayView1<f64>,
    score_kmers: &Basis,
) -> Result<DenseVector> {
    if scores.len() != score_kmers.len() {
        return Err(KmerError::shape_mismatch(
            "scores vs score k-mers",
            score_kmers.len(),
            scores.len(),
        ));
    }
    let aligned = BasisAligner::fit(score_kmers.clone()).transform_matrix(
        feature_matrix,
        matrix_kmers,
        Axis(0),
    )?;
    apply_scores(aligned.view(), scores)
}
