use kmer_features::alphabet::{AlphabetId, AlphabetRegistry};
use kmer_features::error::KmerError;
use kmer_features::matrix::{
    binarize, pairwise, FeatureMatrixBuilder, FilterConfig, Metric, ValueMode,
};
use kmer_features::vectorize::KmerVectorizer;
use ndarray::array;

#[test]
fn test_build_sorted_union_presence() {
    let (matrix, kmers) = FeatureMatrixBuilder::new()
        .build(&[vec!["AC", "AA", "AC"], vec!["CA"]])
        .unwrap();

    assert_eq!(kmers.kmers(), ["AA", "AC", "CA"]);
    assert_eq!(matrix, array![[1.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);
}

#[test]
fn test_build_counts_mode() {
    let (matrix, kmers) = FeatureMatrixBuilder::new()
        .with_mode(ValueMode::Counts)
        .build(&[vec!["AA", "AA", "AC"], vec!["AA"]])
        .unwrap();

    assert_eq!(kmers.kmers(), ["AA", "AC"]);
    assert_eq!(matrix, array![[2.0, 1.0], [1.0, 0.0]]);
}

#[test]
fn test_empty_collections() {
    let empty: Vec<Vec<&str>> = vec![vec![], vec![]];
    let (matrix, kmers) = FeatureMatrixBuilder::new().build(&empty).unwrap();
    assert!(kmers.is_empty());
    assert_eq!(matrix.dim(), (2, 0));
}

#[test]
fn test_filter_band_uses_raw_counts() {
    let collections = [vec!["AA", "AA", "AC"], vec!["AA"]];

    // AA occurs three times in total but is present in only two rows
    let (matrix, kmers) = FeatureMatrixBuilder::new()
        .with_filter(FilterConfig::band(3, 3))
        .build(&collections)
        .unwrap();
    assert_eq!(kmers.kmers(), ["AA"]);
    assert_eq!(matrix, array![[1.0], [1.0]]);

    let (_, kmers) = FeatureMatrixBuilder::new()
        .with_filter(FilterConfig::band(1, 2))
        .build(&collections)
        .unwrap();
    assert_eq!(kmers.kmers(), ["AC"]);

    let result = FeatureMatrixBuilder::new()
        .with_filter(FilterConfig::band(5, 9))
        .build(&collections);
    assert!(matches!(result, Err(KmerError::EmptyFeatureSpace)));
}

#[test]
fn test_disabled_filter_keeps_everything() {
    let filter = FilterConfig::default();
    assert!(!filter.enabled);
    let (_, kmers) = FeatureMatrixBuilder::new()
        .with_filter(filter)
        .build(&[vec!["AA"], vec!["CC"]])
        .unwrap();
    assert_eq!(kmers.len(), 2);
}

#[test]
fn test_build_with_ids_and_dataframe() {
    let matrix = FeatureMatrixBuilder::new()
        .build_with_ids(
            vec!["s1".to_string(), "s2".to_string(), "s3".to_string()],
            &[vec!["AA"], vec!["AC"], vec!["AA", "CC"]],
        )
        .unwrap();
    assert_eq!(matrix.n_sequences(), 3);
    assert_eq!(matrix.n_kmers(), 3);
    assert_eq!(matrix.kmer_major().dim(), (3, 3));
    assert_eq!(matrix.kmer_major()[[2, 2]], 1.0);

    let df = matrix.to_dataframe().unwrap();
    assert_eq!(df.shape(), (3, 4));
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    assert_eq!(names, ["id", "AA", "AC", "CC"]);

    let mismatch = FeatureMatrixBuilder::new().build_with_ids(vec!["s1".to_string()], &[vec!["AA"], vec!["AC"]]);
    assert!(matches!(mismatch, Err(KmerError::ShapeMismatch { .. })));
}

#[test]
fn test_from_batch_expands_counts() {
    let registry = AlphabetRegistry::builtin();
    let hydro = registry.get(&AlphabetId::Index(0)).unwrap();
    let vectorizer = KmerVectorizer::new(hydro, 2).unwrap();
    let records = vec![
        ("a".to_string(), "AAAA".to_string()),
        ("b".to_string(), "MKV".to_string()),
    ];
    let batch = vectorizer.vectorize_batch(&records, None);

    let matrix = FeatureMatrixBuilder::new()
        .with_mode(ValueMode::Counts)
        .from_batch(&batch)
        .unwrap();
    assert_eq!(matrix.ids, ["a", "b"]);
    assert_eq!(matrix.kmers.kmers(), ["SV", "VS", "VV"]);
    assert_eq!(matrix.values, array![[0.0, 0.0, 3.0], [1.0, 1.0, 0.0]]);
}

#[test]
fn test_binarize() {
    let values = array![[0.0, 2.5], [-1.0, 1.0]];
    assert_eq!(binarize(values.view()), array![[0.0, 1.0], [0.0, 1.0]]);
}

#[test]
fn test_pairwise_metrics() {
    let values = array![[1.0, 2.0, 0.0], [0.0, 1.0, 1.0]];

    let jaccard = pairwise(values.view(), Metric::Jaccard);
    assert_eq!(jaccard[[0, 0]], 1.0);
    assert!((jaccard[[0, 1]] - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(jaccard[[0, 1]], jaccard[[1, 0]]);

    let hamming = pairwise(values.view(), Metric::Hamming);
    assert!((hamming[[0, 1]] - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(hamming[[1, 1]], 0.0);

    let matching = pairwise(values.view(), Metric::SimpleMatching);
    assert!((matching[[0, 1]] - 1.0 / 3.0).abs() < 1e-12);

    let euclidean = pairwise(values.view(), Metric::Euclidean);
    assert!((euclidean[[0, 1]] - 3.0_f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_metric_parsing() {
    assert_eq!("jaccard".parse::<Metric>().unwrap(), Metric::Jaccard);
    assert_eq!("Hamming".parse::<Metric>().unwrap(), Metric::Hamming);
    assert_eq!("matching".parse::<Metric>().unwrap(), Metric::SimpleMatching);
    assert_eq!(Metric::Euclidean.to_string(), "euclidean");
    assert!("cosine".parse::<Metric>().is_err());
}
