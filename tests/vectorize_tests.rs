use kmer_features::alphabet::{Alphabet, AlphabetId, AlphabetRegistry};
use kmer_features::basis::Basis;
use kmer_features::error::KmerError;
use kmer_features::vectorize::{KmerVectorizer, VectorizerConfig};
use std::collections::HashMap;

fn binary_alphabet() -> Alphabet {
    Alphabet::custom("ac", "AC", "AC", HashMap::from([('A', 'A'), ('C', 'C')])).unwrap()
}

#[test]
fn test_sparse_and_dense_counts() {
    let alphabet = binary_alphabet();
    let basis = Basis::generate(&alphabet, 2).unwrap();
    let vectorizer = KmerVectorizer::new(&alphabet, 2).unwrap();

    let sparse = vectorizer.vectorize("AACAC", None);
    assert_eq!(
        sparse.counts,
        HashMap::from([("AA".to_string(), 1), ("AC".to_string(), 2), ("CA".to_string(), 1)])
    );
    assert!(sparse.dense.is_none());

    let dense = vectorizer.vectorize("AACAC", Some(&basis));
    assert_eq!(dense.total(), 4);
    assert_eq!(dense.dense.as_ref().unwrap().to_vec(), vec![1.0, 2.0, 1.0, 0.0]);
}

#[test]
fn test_foreign_windows_are_skipped() {
    let alphabet = binary_alphabet();
    let vectorizer = KmerVectorizer::new(&alphabet, 2).unwrap();

    // windows touching G are not counted
    let counts = vectorizer.count("AAGCC");
    assert_eq!(counts.len(), 2);
    assert_eq!(counts["AA"], 1);
    assert_eq!(counts["CC"], 1);

    let sequence = "ACGTACCAGA";
    let valid = sequence
        .as_bytes()
        .windows(2)
        .filter(|w| w.iter().all(|b| *b == b'A' || *b == b'C'))
        .count();
    assert_eq!(vectorizer.vectorize(sequence, None).total(), valid);
}

#[test]
fn test_short_sequence_is_empty() {
    let alphabet = binary_alphabet();
    let basis = Basis::generate(&alphabet, 3).unwrap();
    let vectorizer = KmerVectorizer::new(&alphabet, 3).unwrap();

    let vector = vectorizer.vectorize("AC", Some(&basis));
    assert!(vector.counts.is_empty());
    assert_eq!(vector.dense.unwrap().to_vec(), vec![0.0; 8]);
    assert!(vectorizer.kmers("").is_empty());
}

#[test]
fn test_zero_k_is_invalid() {
    let alphabet = binary_alphabet();
    assert!(matches!(
        KmerVectorizer::new(&alphabet, 0),
        Err(KmerError::InvalidParameter { .. })
    ));
}

#[test]
fn test_exclusion_patterns() {
    let alphabet = binary_alphabet();
    let vectorizer = KmerVectorizer::new(&alphabet, 3)
        .unwrap()
        .with_exclude(["CC"]);

    // ACC and CCA contain CC, including a match at the start of the k-mer
    let kmers = vectorizer.kmers("AACCAA");
    assert_eq!(kmers, ["AAC", "CAA"]);
}

#[test]
fn test_range_restricts_windows() {
    let alphabet = binary_alphabet();
    let vectorizer = KmerVectorizer::new(&alphabet, 2)
        .unwrap()
        .with_range(Some(1), Some(4));
    assert_eq!(vectorizer.kmers("AACCA"), ["AC", "CC"]);

    let tail = KmerVectorizer::new(&alphabet, 2)
        .unwrap()
        .with_range(Some(-2), None);
    assert_eq!(tail.kmers("AACCA"), ["CA"]);
}

#[test]
fn test_reduce_vectorize() {
    let registry = AlphabetRegistry::builtin();
    let hydro = registry.get(&AlphabetId::Index(0)).unwrap();
    let vectorizer = KmerVectorizer::new(hydro, 2).unwrap();

    // MKVX* -> VSV
    let vector = vectorizer.reduce_vectorize("MKVX*", None);
    assert_eq!(vector.kmers(), ["SV", "VS"]);
    assert_eq!(vectorizer.reduced_kmers("MKVX*"), ["SV", "VS"]);

    // without reduction no residue of MKX is a class character
    assert!(vectorizer.vectorize("MKX", None).counts.is_empty());
}

#[test]
fn test_from_config() {
    let registry = AlphabetRegistry::builtin();
    let mut config = VectorizerConfig::new("standard", 2);
    config.exclude = vec!["KK".to_string()];
    let vectorizer = KmerVectorizer::from_config(&registry, &config).unwrap();
    assert_eq!(vectorizer.alphabet().name(), "standard");
    assert_eq!(vectorizer.k(), 2);
    assert!(vectorizer.reduced_kmers("KRA").contains(&"KA".to_string()));
    assert!(!vectorizer.reduced_kmers("KRA").contains(&"KK".to_string()));

    let unknown = VectorizerConfig::new("nope", 2);
    assert!(matches!(
        KmerVectorizer::from_config(&registry, &unknown),
        Err(KmerError::UnknownAlphabet(_))
    ));

    let mut empty_pattern = VectorizerConfig::new(AlphabetId::Index(0), 2);
    empty_pattern.exclude = vec![String::new()];
    assert!(matches!(
        KmerVectorizer::from_config(&registry, &empty_pattern),
        Err(KmerError::InvalidParameter { .. })
    ));
}

#[test]
fn test_batch_keeps_order_and_reports_failures() {
    let registry = AlphabetRegistry::builtin();
    let hydro = registry.get(&AlphabetId::Index(0)).unwrap();
    let vectorizer = KmerVectorizer::new(hydro, 2).unwrap();

    let records = vec![
        ("seq1".to_string(), "MKV".to_string()),
        ("".to_string(), "MKV".to_string()),
        ("seq2".to_string(), "AAAA".to_string()),
        ("seq1".to_string(), "SSS".to_string()),
        ("seq3".to_string(), "M".to_string()),
    ];
    let basis = Basis::generate(hydro, 2).unwrap();
    let batch = vectorizer.vectorize_batch(&records, Some(&basis));

    assert_eq!(batch.ids(), ["seq1", "seq2", "seq3"]);
    assert_eq!(batch.failures.len(), 2);
    assert_eq!(batch.failures[0].0, "");
    assert_eq!(batch.failures[1].0, "seq1");

    // AAAA -> VVVV: three VV windows; basis order SS, SV, VS, VV
    let seq2 = &batch.vectors[1].1;
    assert_eq!(seq2.dense.as_ref().unwrap().to_vec(), vec![0.0, 0.0, 0.0, 3.0]);
    assert_eq!(batch.vectors[2].1.total(), 0);
}
