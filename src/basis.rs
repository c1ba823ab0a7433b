use crate::alphabet::Alphabet;
use crate::error::{KmerError, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Eager enumerations above this many k-mers are logged as a warning
pub const EAGER_BASIS_WARN_LIMIT: usize = 1 << 20;

/// Lazy, restartable enumeration of every k-mer over an alphabet's class set.
///
/// Nothing is allocated up front; each call to [`KmerSet::iter`] starts a new
/// pass in product order (first position varies slowest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerSet {
    classes: Vec<char>,
    k: usize,
}

impl KmerSet {
    /// # Errors
    /// * `KmerError::InvalidParameter` - If `k` is zero
    pub fn new(alphabet: &Alphabet, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(KmerError::invalid_parameter("k", k, "must be at least 1"));
        }
        Ok(KmerSet {
            classes: alphabet.classes().to_vec(),
            k,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of k-mers in the full enumeration, `None` if it does not fit in a usize
    pub fn size(&self) -> Option<usize> {
        let k = u32::try_from(self.k).ok()?;
        self.classes.len().checked_pow(k)
    }

    pub fn iter(&self) -> KmerIter<'_> {
        KmerIter {
            classes: &self.classes,
            indices: vec![0; self.k],
            remaining: self.size(),
            done: self.classes.is_empty(),
        }
    }
}

impl<'a> IntoIterator for &'a KmerSet {
    type Item = String;
    type IntoIter = KmerIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Odometer over class indices, yielding one k-mer string per step
#[derive(Debug, Clone)]
pub struct KmerIter<'a> {
    classes: &'a [char],
    indices: Vec<usize>,
    remaining: Option<usize>,
    done: bool,
}

impl Iterator for KmerIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.done {
            return None;
        }

        let kmer: String = self.indices.iter().map(|&i| self.classes[i]).collect();

        // advance, last position fastest
        self.done = true;
        for position in (0..self.indices.len()).rev() {
            self.indices[position] += 1;
            if self.indices[position] < self.classes.len() {
                self.done = false;
                break;
            }
            self.indices[position] = 0;
        }

        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        Some(kmer)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(remaining) => (remaining, Some(remaining)),
            None => (usize::MAX, None),
        }
    }
}

/// Ordered, deduplicated set of k-mers acting as the coordinate system of a vector.
///
/// A basis is either the full product enumeration ([`Basis::generate`]) or an
/// implicit basis grown from observed k-mers in first-observed order
/// ([`Basis::observe`], [`Basis::from_kmers`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Basis {
    kmers: Vec<String>,
    index: HashMap<String, usize>,
}

impl Basis {
    /// Empty implicit basis
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes the full `|classes|^k` enumeration.
    ///
    /// # Arguments
    /// * `alphabet` - Alphabet whose class order fixes the basis order
    /// * `k` - K-mer length
    ///
    /// # Errors
    /// * `KmerError::InvalidParameter` - If `k` is zero or the enumeration cannot be addressed
    ///
    /// # Example
    /// ```
    /// use kmer_features::alphabet::Alphabet;
    /// use kmer_features::basis::Basis;
    /// use std::collections::HashMap;
    ///
    /// let alphabet = Alphabet::custom("ac", "AC", "AC", HashMap::from([('A', 'A'), ('C', 'C')])).unwrap();
    /// let basis = Basis::generate(&alphabet, 2).unwrap();
    /// assert_eq!(basis.kmers(), ["AA", "AC", "CA", "CC"]);
    /// ```
    pub fn generate(alphabet: &Alphabet, k: usize) -> Result<Self> {
        let set = KmerSet::new(alphabet, k)?;
        let size = set.size().ok_or_else(|| {
            KmerError::invalid_parameter(
                "k",
                k,
                format!("{}^{} k-mers cannot be enumerated", alphabet.size(), k),
            )
        })?;
        if size > EAGER_BASIS_WARN_LIMIT {
            warn!(
                "materializing {} k-mers for alphabet {} and k = {}",
                size,
                alphabet.name(),
                k
            );
        }
        debug!("generated basis of {} k-mers ({}, k = {})", size, alphabet.name(), k);
        Ok(Self::from_kmers(set.iter()))
    }

    /// Builds a basis from k-mers in first-observed order, dropping repeats
    pub fn from_kmers<I, S>(kmers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut basis = Self::new();
        for kmer in kmers {
            basis.observe(kmer);
        }
        basis
    }

    /// Adds `kmer` if unseen and returns its position
    pub fn observe(&mut self, kmer: impl Into<String>) -> usize {
        let kmer = kmer.into();
        if let Some(&position) = self.index.get(&kmer) {
            return position;
        }
        let position = self.kmers.len();
        self.index.insert(kmer.clone(), position);
        self.kmers.push(kmer);
        position
    }

    pub fn position(&self, kmer: &str) -> Option<usize> {
        self.index.get(kmer).copied()
    }

    pub fn contains(&self, kmer: &str) -> bool {
        self.index.contains_key(kmer)
    }

    pub fn get(&self, position: usize) -> Option<&str> {
        self.kmers.get(position).map(String::as_str)
    }

    pub fn kmers(&self) -> &[String] {
        &self.kmers
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.kmers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// Feature labels in the form `KMER-{k}-{alphabet label}-{kmer}`
    pub fn labels(&self, alphabet: &Alphabet) -> Vec<String> {
        self.kmers
            .iter()
            .map(|kmer| format!("KMER-{}-{}-{}", kmer.chars().count(), alphabet.label(), kmer))
            .collect()
    }
}

impl From<Vec<String>> for Basis {
    fn from(kmers: Vec<String>) -> Self {
        Self::from_kmers(kmers)
    }
}

impl From<Basis> for Vec<String> {
    fn from(basis: Basis) -> Self {
        basis.kmers
    }
}

/// Shares fully enumerated bases across callers, keyed by the ordered class set and k
#[derive(Debug, Default)]
pub struct BasisCache {
    bases: Mutex<HashMap<(Vec<char>, usize), Arc<Basis>>>,
}

impl BasisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached basis for `(alphabet, k)`, generating it on first use
    pub fn get_or_generate(&self, alphabet: &Alphabet, k: usize) -> Result<Arc<Basis>> {
        let key = (alphabet.classes().to_vec(), k);
        let mut bases = self
            .bases
            .lock()
            .map_err(|_| KmerError::Data("basis cache lock poisoned".into()))?;
        if let Some(basis) = bases.get(&key) {
            return Ok(Arc::clone(basis));
        }
        let basis = Arc::new(Basis::generate(alphabet, k)?);
        bases.insert(key, Arc::clone(&basis));
        Ok(basis)
    }

    pub fn len(&self) -> usize {
        self.bases.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
