use crate::error::{KmerError, Result};
use phf::phf_map;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// The 20 canonical amino acid residues, in the order used for the full alphabet
pub const STANDARD_ALPHABET: &str = "AILMVFYWSTQNCHDEKRGP";

/// Trailing marker some sequence sources append to protein sequences
pub const STOP_MARKER: char = '*';

// 2-class hydrophobicity
static HYDRO: phf::Map<char, char> = phf_map! {
    'S' => 'S', 'F' => 'S', 'T' => 'S', 'N' => 'S', 'K' => 'S', 'Y' => 'S', 'E' => 'S',
    'Q' => 'S', 'C' => 'S', 'W' => 'S', 'P' => 'S', 'H' => 'S', 'D' => 'S', 'R' => 'S',
    'V' => 'V', 'M' => 'V', 'L' => 'V', 'A' => 'V', 'G' => 'V', 'I' => 'V',
};

// 7-class side chain chemistry
static STANDARD: phf::Map<char, char> = phf_map! {
    'A' => 'A', 'G' => 'A', 'I' => 'A', 'L' => 'A', 'M' => 'A', 'V' => 'A',
    'P' => 'P',
    'F' => 'F', 'W' => 'F', 'Y' => 'F',
    'N' => 'N', 'Q' => 'N', 'S' => 'N', 'T' => 'N',
    'D' => 'D', 'E' => 'D',
    'K' => 'K', 'R' => 'K', 'H' => 'K',
    'C' => 'C',
};

// 3-class solvent accessibility: buried, intermediate, exposed
static SOLVACC: phf::Map<char, char> = phf_map! {
    'C' => 'C', 'I' => 'C', 'L' => 'C', 'M' => 'C', 'F' => 'C', 'V' => 'C', 'W' => 'C',
    'A' => 'A', 'G' => 'A', 'H' => 'A', 'S' => 'A', 'T' => 'A', 'Y' => 'A',
    'P' => 'P', 'D' => 'P', 'E' => 'P', 'K' => 'P', 'N' => 'P', 'Q' => 'P', 'R' => 'P',
};

// 3-class hydrophobic / hydrophilic / charged
static HYDROCHARGE: phf::Map<char, char> = phf_map! {
    'L' => 'L', 'A' => 'L', 'F' => 'L', 'G' => 'L', 'I' => 'L', 'M' => 'L', 'V' => 'L',
    'W' => 'L', 'Y' => 'L',
    'H' => 'H', 'N' => 'H', 'P' => 'H', 'Q' => 'H', 'S' => 'H', 'T' => 'H',
    'C' => 'C', 'D' => 'C', 'E' => 'C', 'K' => 'C', 'R' => 'C',
};

// 3-class hydrophobic / hydrophilic / structure breaker
static HYDROSTRUCT: phf::Map<char, char> = phf_map! {
    'L' => 'L', 'C' => 'L', 'F' => 'L', 'I' => 'L', 'M' => 'L', 'V' => 'L', 'W' => 'L',
    'Y' => 'L',
    'H' => 'H', 'A' => 'H', 'D' => 'H', 'E' => 'H', 'K' => 'H', 'N' => 'H', 'Q' => 'H',
    'R' => 'H', 'S' => 'H', 'T' => 'H',
    'B' => 'B', 'G' => 'B', 'P' => 'B',
};

// 10-class compact alphabet
static COMPACT10: phf::Map<char, char> = phf_map! {
    'A' => 'A', 'S' => 'A', 'T' => 'A',
    'C' => 'C',
    'D' => 'D', 'E' => 'D',
    'G' => 'G',
    'H' => 'H',
    'K' => 'K', 'R' => 'K',
    'N' => 'N', 'Q' => 'N',
    'P' => 'P',
    'F' => 'F', 'W' => 'F', 'Y' => 'F',
    'L' => 'L', 'I' => 'L', 'M' => 'L', 'V' => 'L',
};

/// Identifies an alphabet either by registry index or by name/label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlphabetId {
    Index(usize),
    Name(String),
}

impl FromStr for AlphabetId {
    type Err = KmerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KmerError::invalid_parameter(
                "alphabet",
                s,
                "alphabet identifier cannot be empty",
            ));
        }
        match s.parse::<usize>() {
            Ok(index) => Ok(AlphabetId::Index(index)),
            Err(_) => Ok(AlphabetId::Name(s.to_string())),
        }
    }
}

impl fmt::Display for AlphabetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlphabetId::Index(index) => write!(f, "{}", index),
            AlphabetId::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<usize> for AlphabetId {
    fn from(index: usize) -> Self {
        AlphabetId::Index(index)
    }
}

impl From<&str> for AlphabetId {
    fn from(name: &str) -> Self {
        AlphabetId::Name(name.to_string())
    }
}

/// How an alphabet translates input characters into class representatives
#[derive(Debug, Clone)]
pub enum Mapping {
    /// Every class character maps to itself, anything else is dropped
    Identity,
    /// Built-in reduction table
    Static(&'static phf::Map<char, char>),
    /// Caller-supplied or randomised reduction table
    Custom(HashMap<char, char>),
}

impl Mapping {
    fn get(&self, c: char, class_set: &HashSet<char>) -> Option<char> {
        match self {
            Mapping::Identity => class_set.contains(&c).then_some(c),
            Mapping::Static(map) => map.get(&c).copied(),
            Mapping::Custom(map) => map.get(&c).copied(),
        }
    }

    fn entries(&self) -> Vec<(char, char)> {
        match self {
            Mapping::Identity => Vec::new(),
            Mapping::Static(map) => map.entries().map(|(k, v)| (*k, *v)).collect(),
            Mapping::Custom(map) => map.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }
}

/// A named character-to-class mapping over a canonical, ordered class set
///
/// The class set order is the contract basis enumeration keys off, so two
/// alphabets with the same classes in a different order produce differently
/// ordered bases.
#[derive(Debug, Clone)]
pub struct Alphabet {
    name: String,
    label: String,
    classes: Vec<char>,
    class_set: HashSet<char>,
    mapping: Mapping,
}

impl Alphabet {
    fn builtin(name: &str, label: &str, classes: &str, mapping: Mapping) -> Self {
        Alphabet {
            name: name.to_string(),
            label: label.to_string(),
            classes: classes.chars().collect(),
            class_set: classes.chars().collect(),
            mapping,
        }
    }

    /// Creates the unreduced alphabet over the 20 canonical residues
    pub fn full() -> Self {
        Self::builtin("None", "None", STANDARD_ALPHABET, Mapping::Identity)
    }

    /// Creates a caller-defined reduced alphabet
    ///
    /// # Arguments
    /// * `name` - Registry name of the alphabet
    /// * `label` - Short label used in feature names
    /// * `classes` - Class representatives in canonical order
    /// * `mapping` - Source character to class representative
    ///
    /// # Errors
    /// * `KmerError::InvalidParameter` - If the class set is empty or repeats a character,
    ///   a mapping target is not a class, or a class does not map to itself
    pub fn custom(
        name: impl Into<String>,
        label: impl Into<String>,
        classes: &str,
        mapping: HashMap<char, char>,
    ) -> Result<Self> {
        let name = name.into();
        let class_list: Vec<char> = classes.chars().collect();
        let class_set: HashSet<char> = class_list.iter().copied().collect();

        if class_list.is_empty() {
            return Err(KmerError::invalid_parameter(
                "classes",
                classes,
                "class set cannot be empty",
            ));
        }
        if class_set.len() != class_list.len() {
            return Err(KmerError::invalid_parameter(
                "classes",
                classes,
                "class characters must be distinct",
            ));
        }
        if let Some((source, target)) = mapping.iter().find(|(_, t)| !class_set.contains(*t)) {
            return Err(KmerError::invalid_parameter(
                "mapping",
                format!("{}->{}", source, target),
                "mapping target is not a class character",
            ));
        }
        if let Some(class) = class_list.iter().find(|c| mapping.get(*c) != Some(*c)) {
            return Err(KmerError::invalid_parameter(
                "mapping",
                class,
                "every class character must map to itself",
            ));
        }

        Ok(Alphabet {
            label: label.into(),
            name,
            classes: class_list,
            class_set,
            mapping: Mapping::Custom(mapping),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Class representatives in canonical order
    pub fn classes(&self) -> &[char] {
        &self.classes
    }

    /// Number of classes
    pub fn size(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if `c` is one of the class representatives
    pub fn contains(&self, c: char) -> bool {
        self.class_set.contains(&c)
    }

    /// Translates a single character, `None` if it has no mapping
    pub fn map_char(&self, c: char) -> Option<char> {
        self.mapping.get(c, &self.class_set)
    }

    /// Reduces a sequence into this alphabet's class space.
    ///
    /// A trailing stop marker is trimmed first. Characters without a mapping
    /// are dropped, so the output can be shorter than the input.
    ///
    /// # Example
    /// ```
    /// use kmer_features::alphabet::{AlphabetId, AlphabetRegistry};
    ///
    /// let registry = AlphabetRegistry::builtin();
    /// let hydro = registry.get(&AlphabetId::Index(0)).unwrap();
    /// assert_eq!(hydro.reduce("MKV*"), "VSV");
    /// ```
    pub fn reduce(&self, sequence: &str) -> String {
        sequence
            .trim_end_matches(STOP_MARKER)
            .chars()
            .filter_map(|c| self.map_char(c))
            .collect()
    }

    /// Builds a randomised variant of this alphabet for use as a negative control.
    ///
    /// Each class keeps its representative and its size, while the remaining
    /// residues are shuffled and redistributed across classes. The result is
    /// named `"{name}_random"` and labeled `"{label}R"`; an identity alphabet
    /// keeps its mapping unchanged.
    pub fn randomized<R: Rng + ?Sized>(&self, rng: &mut R) -> Alphabet {
        let entries = self.mapping.entries();
        if entries.is_empty() {
            // identity mapping has nothing to shuffle
            return Alphabet {
                name: format!("{}_random", self.name),
                label: format!("{}R", self.label),
                ..self.clone()
            };
        }

        let mut members: Vec<char> = entries
            .iter()
            .filter(|(source, target)| source != target)
            .map(|(source, _)| *source)
            .collect();
        members.sort_unstable();

        let sizes: Vec<(char, usize)> = self
            .classes
            .iter()
            .map(|class| {
                let size = entries
                    .iter()
                    .filter(|(source, target)| target == class && source != class)
                    .count();
                (*class, size)
            })
            .collect();

        members.shuffle(rng);

        let mut mapping: HashMap<char, char> = self.classes.iter().map(|c| (*c, *c)).collect();
        let mut remaining = members.into_iter();
        for (class, size) in &sizes {
            for member in remaining.by_ref().take(*size) {
                mapping.insert(member, *class);
            }
        }

        Alphabet {
            name: format!("{}_random", self.name),
            label: format!("{}R", self.label),
            classes: self.classes.clone(),
            class_set: self.class_set.clone(),
            mapping: Mapping::Custom(mapping),
        }
    }
}

/// Immutable set of alphabets resolvable by index, name or label.
///
/// Construct once at start-up and pass by reference to anything that needs
/// alphabet lookups.
#[derive(Debug, Clone)]
pub struct AlphabetRegistry {
    alphabets: Vec<Alphabet>,
}

impl Default for AlphabetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl AlphabetRegistry {
    /// Registry with the six reduced alphabets at indices 0-5 and the full alphabet at 6
    pub fn builtin() -> Self {
        AlphabetRegistry {
            alphabets: vec![
                Alphabet::builtin("hydro", "RED0", "SV", Mapping::Static(&HYDRO)),
                Alphabet::builtin("standard", "RED1", "APFNDKC", Mapping::Static(&STANDARD)),
                Alphabet::builtin("solvacc", "RED2", "CAP", Mapping::Static(&SOLVACC)),
                Alphabet::builtin("hydrocharge", "RED3", "LHC", Mapping::Static(&HYDROCHARGE)),
                Alphabet::builtin("hydrostruct", "RED4", "LHB", Mapping::Static(&HYDROSTRUCT)),
                Alphabet::builtin("compact10", "RED5", "ACDGHKNPFL", Mapping::Static(&COMPACT10)),
                Alphabet::full(),
            ],
        }
    }

    /// Returns a registry that additionally contains `alphabet`
    ///
    /// # Errors
    /// * `KmerError::InvalidParameter` - If the name or label is already registered
    pub fn with(mut self, alphabet: Alphabet) -> Result<Self> {
        let taken = self.alphabets.iter().any(|a| {
            a.name.eq_ignore_ascii_case(&alphabet.name) || a.label.eq_ignore_ascii_case(&alphabet.label)
        });
        if taken {
            return Err(KmerError::invalid_parameter(
                "alphabet",
                &alphabet.name,
                "an alphabet with this name or label is already registered",
            ));
        }
        self.alphabets.push(alphabet);
        Ok(self)
    }

    /// Looks up an alphabet by index, name or label (case-insensitive).
    /// `"full"` is accepted as an alias of the unreduced alphabet.
    pub fn get(&self, id: &AlphabetId) -> Result<&Alphabet> {
        let found = match id {
            AlphabetId::Index(index) => self.alphabets.get(*index),
            AlphabetId::Name(name) => {
                let name = if name.eq_ignore_ascii_case("full") {
                    "None"
                } else {
                    name.as_str()
                };
                self.alphabets.iter().find(|a| {
                    a.name.eq_ignore_ascii_case(name) || a.label.eq_ignore_ascii_case(name)
                })
            }
        };
        found.ok_or_else(|| KmerError::UnknownAlphabet(id.to_string()))
    }

    /// Reduces `sequence` with the alphabet registered under `id`
    pub fn reduce(&self, sequence: &str, id: &AlphabetId) -> Result<String> {
        Ok(self.get(id)?.reduce(sequence))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alphabet> {
        self.alphabets.iter()
    }

    pub fn len(&self) -> usize {
        self.alphabets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphabets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_total_over_standard_residues() {
        for table in [&HYDRO, &STANDARD, &SOLVACC, &HYDROCHARGE, &HYDROSTRUCT, &COMPACT10] {
            for residue in STANDARD_ALPHABET.chars() {
                assert!(table.contains_key(&residue), "missing {}", residue);
            }
        }
    }

    #[test]
    fn test_builtin_classes_map_to_themselves() {
        let registry = AlphabetRegistry::builtin();
        for alphabet in registry.iter() {
            for class in alphabet.classes() {
                assert_eq!(alphabet.map_char(*class), Some(*class), "{}", alphabet.name());
            }
        }
    }
}
