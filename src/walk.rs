use crate::alphabet::Alphabet;
use crate::basis::Basis;
use crate::error::{KmerError, Result};
use crate::vectorize::KmerVectorizer;
use log::{debug, info};

/// K-mer totals accumulated over many sequences, in first-observed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSpace {
    basis: Basis,
    totals: Vec<usize>,
}

impl FeatureSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulates every reduced k-mer of `sequences`
    pub fn from_sequences<'s, I>(vectorizer: &KmerVectorizer, sequences: I) -> Self
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut space = Self::new();
        for sequence in sequences {
            let reduced = vectorizer.alphabet().reduce(sequence);
            space.add_kmers(vectorizer.kmers(&reduced));
        }
        debug!("feature space holds {} distinct k-mers", space.len());
        space
    }

    pub fn add_kmers<I, S>(&mut self, kmers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for kmer in kmers {
            let position = self.basis.observe(kmer);
            if position == self.totals.len() {
                self.totals.push(0);
            }
            self.totals[position] += 1;
        }
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn total(&self, kmer: &str) -> usize {
        self.basis.position(kmer).map_or(0, |p| self.totals[p])
    }

    pub fn len(&self) -> usize {
        self.basis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basis.is_empty()
    }

    /// Number of k-mers occurring at least `threshold` times
    pub fn count_at_least(&self, threshold: usize) -> usize {
        self.totals.iter().filter(|&&t| t >= threshold).count()
    }

    /// Keeps k-mers represented at least `min_rep_thresh` times.
    ///
    /// A threshold strictly between 0 and 1 is a fraction of the number of
    /// distinct k-mers. Order of the surviving k-mers is preserved.
    ///
    /// # Errors
    /// * `KmerError::InvalidParameter` - If the threshold is negative or not finite
    /// * `KmerError::EmptyFeatureSpace` - If no k-mer survives
    pub fn filter(&self, min_rep_thresh: f64) -> Result<Basis> {
        if !min_rep_thresh.is_finite() || min_rep_thresh < 0.0 {
            return Err(KmerError::invalid_parameter(
                "min_rep_thresh",
                min_rep_thresh,
                "must be a finite, non-negative number",
            ));
        }
        let threshold = if min_rep_thresh > 0.0 && min_rep_thresh < 1.0 {
            min_rep_thresh * self.len() as f64
        } else {
            min_rep_thresh
        };

        let kept = Basis::from_kmers(
            self.basis
                .iter()
                .zip(&self.totals)
                .filter(|(_, &total)| total as f64 >= threshold)
                .map(|(kmer, _)| kmer),
        );
        if kept.is_empty() {
            return Err(KmerError::EmptyFeatureSpace);
        }
        Ok(kept)
    }
}

/// Feature space summary for one k
#[derive(Debug, Clone, PartialEq)]
pub struct WalkStep {
    pub k: usize,
    pub distinct: usize,
    pub frequent: usize,
    pub possible: f64,
}

impl WalkStep {
    /// Fraction of the theoretical k-mer space that is frequent
    pub fn coverage(&self) -> f64 {
        self.frequent as f64 / self.possible
    }
}

/// Summarizes how the feature space grows for k = 1 up to `max_k`.
///
/// # Errors
/// * `KmerError::InvalidParameter` - If `max_k` is zero
pub fn kmer_walk(
    alphabet: &Alphabet,
    sequences: &[&str],
    max_k: usize,
    min_threshold: usize,
) -> Result<Vec<WalkStep>> {
    if max_k == 0 {
        return Err(KmerError::invalid_parameter("max_k", max_k, "must be at least 1"));
    }

    let mut steps = Vec::with_capacity(max_k);
    for k in 1..=max_k {
        let vectorizer = KmerVectorizer::new(alphabet, k)?;
        let space = FeatureSpace::from_sequences(&vectorizer, sequences.iter().copied());
        let step = WalkStep {
            k,
            distinct: space.len(),
            frequent: space.count_at_least(min_threshold),
            possible: (alphabet.size() as f64).powi(k as i32),
        };
        info!(
            "k = {}: {} distinct k-mers, {} occurring at least {} times, {:.4}% of {} possible",
            k,
            step.distinct,
            step.frequent,
            min_threshold,
            step.coverage() * 100.0,
            step.possible
        );
        steps.push(step);
    }
    Ok(steps)
}
