use crate::align::BasisAligner;
use crate::alphabet::AlphabetRegistry;
use crate::basis::Basis;
use crate::error::{KmerError, Result};
use crate::matrix::{FeatureMatrix, FeatureMatrixBuilder};
use crate::score::{apply_scores_aligned, background_probability, ClassProbabilityScorer, ScoreMethod, ScoreTable};
use crate::types::{Matrix, SequenceRecord};
use crate::vectorize::{KmerVectorizer, VectorizerConfig};
use log::info;
use ndarray::{Array1, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};

/// Vectorizer settings plus per-class k-mer scores fitted on labeled sequences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmerModel {
    pub config: VectorizerConfig,
    pub method: ScoreMethod,
    pub scores: ScoreTable,
}

/// Per-sequence, per-class totals from applying a model
#[derive(Debug)]
pub struct ModelScores {
    pub ids: Vec<String>,
    pub labels: Vec<String>,
    /// Sequences as rows, labels as columns
    pub totals: Matrix,
    pub failures: Vec<(String, KmerError)>,
}

impl ModelScores {
    /// Label with the highest total for each sequence
    pub fn predictions(&self) -> Vec<String> {
        self.totals
            .axis_iter(Axis(0))
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
                self.labels.get(best.0).cloned().unwrap_or_default()
            })
            .collect()
    }

    /// `id`, one total column per label, then `prediction`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let mut columns = vec![Column::new("id".into(), self.ids.clone())];
        for (label, totals) in self.labels.iter().zip(self.totals.axis_iter(Axis(1))) {
            columns.push(Column::new(label.as_str().into(), totals.to_vec()));
        }
        columns.push(Column::new("prediction".into(), self.predictions()));
        DataFrame::new(columns).map_err(|e| KmerError::Data(e.to_string()))
    }
}

fn build_matrix(
    registry: &AlphabetRegistry,
    config: &VectorizerConfig,
    records: &[SequenceRecord],
) -> Result<(FeatureMatrix, Vec<(String, KmerError)>)> {
    let vectorizer = KmerVectorizer::from_config(registry, config)?;
    let batch = vectorizer.vectorize_batch(records, None);
    let matrix = FeatureMatrixBuilder::new().from_batch(&batch)?;
    Ok((matrix, batch.failures))
}

impl KmerModel {
    /// Vectorizes labeled sequences, builds their presence matrix and scores it.
    ///
    /// Records that fail to vectorize are left out together with their label.
    /// Background sequences, when given, are aligned onto the fitted k-mers and
    /// turned into presence probabilities.
    ///
    /// # Errors
    /// * `KmerError::ShapeMismatch` - If `labels` does not match `records`
    /// * Any error from vectorizer configuration or [`ClassProbabilityScorer::score`]
    pub fn fit(
        registry: &AlphabetRegistry,
        config: VectorizerConfig,
        method: ScoreMethod,
        records: &[SequenceRecord],
        labels: &[String],
        background: Option<&[SequenceRecord]>,
    ) -> Result<Self> {
        if labels.len() != records.len() {
            return Err(KmerError::shape_mismatch(
                "labels vs sequences",
                records.len(),
                labels.len(),
            ));
        }

        let (matrix, failures) = build_matrix(registry, &config, records)?;
        let mut label_of: HashMap<&str, &str> = HashMap::new();
        for ((id, _), label) in records.iter().zip(labels) {
            label_of.entry(id.as_str()).or_insert(label.as_str());
        }
        let kept_labels: Vec<&str> = matrix
            .ids
            .iter()
            .filter_map(|id| label_of.get(id.as_str()).copied())
            .collect();

        let background = match background {
            Some(records) => {
                let (bg, _) = build_matrix(registry, &config, records)?;
                let aligned = BasisAligner::fit(matrix.kmers.clone()).transform_matrix(
                    bg.values.view(),
                    bg.kmers.kmers(),
                    Axis(1),
                )?;
                Some(background_probability(aligned.t()))
            }
            None => None,
        };

        let scores = ClassProbabilityScorer::new(method).score(
            matrix.kmer_major().view(),
            &kept_labels,
            Some(matrix.kmers.kmers()),
            background.as_ref().map(|bg| bg.view()),
        )?;
        info!(
            "fitted model on {} sequences ({} skipped), {} k-mers, {} classes",
            matrix.n_sequences(),
            failures.len(),
            matrix.n_kmers(),
            scores.classes.len()
        );

        Ok(KmerModel {
            config,
            method,
            scores,
        })
    }

    /// The k-mer basis the scores are ordered by
    pub fn basis(&self) -> Basis {
        Basis::from_kmers(self.scores.kmers.iter().map(String::as_str))
    }

    /// Scores new sequences against every fitted class
    pub fn apply(&self, registry: &AlphabetRegistry, records: &[SequenceRecord]) -> Result<ModelScores> {
        let (matrix, failures) = build_matrix(registry, &self.config, records)?;
        let basis = self.basis();
        let kmer_major = matrix.kmer_major();

        let mut totals = Matrix::zeros((matrix.n_sequences(), self.scores.classes.len()));
        for (column, class) in self.scores.classes.iter().enumerate() {
            let scores = Array1::from_vec(class.score.clone());
            let class_totals =
                apply_scores_aligned(kmer_major.view(), matrix.kmers.kmers(), scores.view(), &basis)?;
            totals.column_mut(column).assign(&class_totals);
        }

        Ok(ModelScores {
            ids: matrix.ids,
            labels: self.scores.labels().into_iter().map(String::from).collect(),
            totals,
            failures,
        })
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        ciborium::into_writer(self, writer).map_err(|e| KmerError::Serialization(e.to_string()))
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        ciborium::from_reader(reader).map_err(|e| KmerError::Serialization(e.to_string()))
    }
}
