use crate::alphabet::{Alphabet, AlphabetId, AlphabetRegistry};
use crate::basis::Basis;
use crate::error::{KmerError, Result};
use crate::types::{DenseVector, KmerCounts, SequenceRecord};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Serializable description of how sequences are turned into k-mer vectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    pub alphabet: AlphabetId,
    pub k: usize,
    /// K-mers containing any of these substrings are discarded
    #[serde(default)]
    pub exclude: Vec<String>,
    /// First residue of the scanned region; negative values count from the end
    #[serde(default)]
    pub start: Option<isize>,
    /// End (exclusive) of the scanned region
    #[serde(default)]
    pub end: Option<usize>,
}

impl VectorizerConfig {
    pub fn new(alphabet: impl Into<AlphabetId>, k: usize) -> Self {
        VectorizerConfig {
            alphabet: alphabet.into(),
            k,
            exclude: Vec::new(),
            start: None,
            end: None,
        }
    }
}

/// K-mer counts for one sequence, with an optional dense view over a basis
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceVector {
    pub counts: KmerCounts,
    pub dense: Option<DenseVector>,
}

impl SequenceVector {
    /// Number of counted windows
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Observed k-mers, sorted
    pub fn kmers(&self) -> Vec<String> {
        let mut kmers: Vec<String> = self.counts.keys().cloned().collect();
        kmers.sort_unstable();
        kmers
    }
}

/// Result of vectorizing many sequences; failed records do not abort the batch
#[derive(Debug, Default)]
pub struct BatchVectors {
    pub vectors: Vec<(String, SequenceVector)>,
    pub failures: Vec<(String, KmerError)>,
}

impl BatchVectors {
    pub fn ids(&self) -> Vec<&str> {
        self.vectors.iter().map(|(id, _)| id.as_str()).collect()
    }
}

/// Slides a window of length k over sequences and counts valid k-mers
#[derive(Debug, Clone)]
pub struct KmerVectorizer<'a> {
    alphabet: &'a Alphabet,
    k: usize,
    exclude: Vec<String>,
    start: Option<isize>,
    end: Option<usize>,
}

impl<'a> KmerVectorizer<'a> {
    /// # Errors
    /// * `KmerError::InvalidParameter` - If `k` is zero
    pub fn new(alphabet: &'a Alphabet, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(KmerError::invalid_parameter("k", k, "must be at least 1"));
        }
        Ok(KmerVectorizer {
            alphabet,
            k,
            exclude: Vec::new(),
            start: None,
            end: None,
        })
    }

    /// Resolves the configured alphabet and validates the configuration
    ///
    /// # Errors
    /// * `KmerError::UnknownAlphabet` - If the alphabet is not registered
    /// * `KmerError::InvalidParameter` - If `k` is zero or an exclusion pattern is empty
    pub fn from_config(registry: &'a AlphabetRegistry, config: &VectorizerConfig) -> Result<Self> {
        let alphabet = registry.get(&config.alphabet)?;
        if config.exclude.iter().any(String::is_empty) {
            return Err(KmerError::invalid_parameter(
                "exclude",
                "\"\"",
                "exclusion patterns cannot be empty",
            ));
        }
        Ok(Self::new(alphabet, config.k)?
            .with_exclude(config.exclude.iter().cloned())
            .with_range(config.start, config.end))
    }

    /// Discards k-mers that contain any of `patterns`
    pub fn with_exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = patterns
            .into_iter()
            .map(Into::into)
            .filter(|p: &String| !p.is_empty())
            .collect();
        self
    }

    /// Restricts counting to windows inside `[start, end)` of the sequence
    pub fn with_range(mut self, start: Option<isize>, end: Option<usize>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn alphabet(&self) -> &Alphabet {
        self.alphabet
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn region(&self, len: usize) -> (usize, usize) {
        let start = match self.start {
            Some(start) if start < 0 => len.saturating_sub(start.unsigned_abs()),
            Some(start) => (start as usize).min(len),
            None => 0,
        };
        let end = self.end.map_or(len, |end| end.min(len));
        (start, end.max(start))
    }

    fn is_excluded(&self, kmer: &str) -> bool {
        self.exclude.iter().any(|pattern| kmer.contains(pattern.as_str()))
    }

    /// Every accepted k-mer of `sequence`, in window order.
    ///
    /// Windows containing characters outside the alphabet's class set are
    /// skipped, as are k-mers matching an exclusion pattern. A sequence shorter
    /// than k yields nothing.
    pub fn kmers(&self, sequence: &str) -> Vec<String> {
        let residues: Vec<char> = sequence.chars().collect();
        let (start, end) = self.region(residues.len());
        let region = &residues[start..end];
        if region.len() < self.k {
            return Vec::new();
        }

        region
            .windows(self.k)
            .filter(|window| window.iter().all(|&c| self.alphabet.contains(c)))
            .map(|window| window.iter().collect::<String>())
            .filter(|kmer| !self.is_excluded(kmer))
            .collect()
    }

    /// Sparse k-mer counts of `sequence`
    pub fn count(&self, sequence: &str) -> KmerCounts {
        let mut counts = KmerCounts::new();
        for kmer in self.kmers(sequence) {
            *counts.entry(kmer).or_insert(0) += 1;
        }
        counts
    }

    /// Counts k-mers of `sequence` as given (no reduction).
    ///
    /// When `basis` is supplied the result also carries a dense vector with
    /// one slot per basis member, zero for members never observed.
    ///
    /// # Example
    /// ```
    /// use kmer_features::alphabet::Alphabet;
    /// use kmer_features::basis::Basis;
    /// use kmer_features::vectorize::KmerVectorizer;
    /// use std::collections::HashMap;
    ///
    /// let alphabet = Alphabet::custom("ac", "AC", "AC", HashMap::from([('A', 'A'), ('C', 'C')])).unwrap();
    /// let basis = Basis::generate(&alphabet, 2).unwrap();
    /// let vector = KmerVectorizer::new(&alphabet, 2).unwrap().vectorize("AACAC", Some(&basis));
    /// assert_eq!(vector.dense.unwrap().to_vec(), vec![1.0, 2.0, 1.0, 0.0]);
    /// ```
    pub fn vectorize(&self, sequence: &str, basis: Option<&Basis>) -> SequenceVector {
        let counts = self.count(sequence);
        let dense = basis.map(|basis| to_dense(&counts, basis));
        SequenceVector { counts, dense }
    }

    /// Reduces `sequence` into the alphabet before counting
    pub fn reduce_vectorize(&self, sequence: &str, basis: Option<&Basis>) -> SequenceVector {
        self.vectorize(&self.alphabet.reduce(sequence), basis)
    }

    /// Distinct k-mers of the reduced sequence, sorted; input for
    /// [`crate::matrix::FeatureMatrixBuilder`]
    pub fn reduced_kmers(&self, sequence: &str) -> Vec<String> {
        self.reduce_vectorize(sequence, None).kmers()
    }

    /// Reduces and vectorizes many `(id, sequence)` records in parallel.
    ///
    /// Output order follows input order. Records with an empty or repeated
    /// identifier are reported in `failures` and the rest still proceed.
    pub fn vectorize_batch(&self, records: &[SequenceRecord], basis: Option<&Basis>) -> BatchVectors {
        let mut seen = HashSet::new();
        let checked: Vec<Result<&SequenceRecord>> = records
            .iter()
            .map(|record| {
                if record.0.is_empty() {
                    Err(KmerError::invalid_parameter("id", "\"\"", "sequence identifier is empty"))
                } else if !seen.insert(record.0.as_str()) {
                    Err(KmerError::invalid_parameter(
                        "id",
                        &record.0,
                        "sequence identifier is not unique",
                    ))
                } else {
                    Ok(record)
                }
            })
            .collect();

        let results: Vec<(String, Result<SequenceVector>)> = checked
            .into_par_iter()
            .zip(records.par_iter())
            .map(|(checked, (id, _))| {
                let vector = checked.map(|(_, sequence)| self.reduce_vectorize(sequence, basis));
                (id.clone(), vector)
            })
            .collect();

        let mut batch = BatchVectors::default();
        for (id, result) in results {
            match result {
                Ok(vector) => batch.vectors.push((id, vector)),
                Err(e) => {
                    warn!("skipping sequence {}: {}", id, e);
                    batch.failures.push((id, e));
                }
            }
        }
        info!(
            "vectorized {} sequences ({} failed) with alphabet {} and k = {}",
            batch.vectors.len(),
            batch.failures.len(),
            self.alphabet.name(),
            self.k
        );
        batch
    }
}

/// Dense vector over `basis` from sparse counts; unobserved members are zero
/// and observed k-mers outside the basis are ignored.
pub fn to_dense(counts: &KmerCounts, basis: &Basis) -> DenseVector {
    let mut dense = DenseVector::zeros(basis.len());
    for (kmer, count) in counts {
        if let Some(position) = basis.position(kmer) {
            dense[position] = *count as f64;
        }
    }
    dense
}
