use kmer_features::alphabet::{AlphabetId, AlphabetRegistry};
use kmer_features::error::KmerError;
use kmer_features::model::KmerModel;
use kmer_features::score::ScoreMethod;
use kmer_features::types::SequenceRecord;
use kmer_features::vectorize::VectorizerConfig;

fn records(pairs: &[(&str, &str)]) -> Vec<SequenceRecord> {
    pairs
        .iter()
        .map(|(id, sequence)| (id.to_string(), sequence.to_string()))
        .collect()
}

fn training() -> (Vec<SequenceRecord>, Vec<String>) {
    // hydro reduction: A/M -> V, K/S -> S
    let records = records(&[
        ("a1", "AAAA"),
        ("a2", "AAAM"),
        ("b1", "KKKK"),
        ("b2", "KKSK"),
    ]);
    let labels = ["a", "a", "b", "b"].iter().map(|s| s.to_string()).collect();
    (records, labels)
}

fn fit(method: ScoreMethod, background: Option<&[SequenceRecord]>) -> KmerModel {
    let registry = AlphabetRegistry::builtin();
    let (records, labels) = training();
    KmerModel::fit(
        &registry,
        VectorizerConfig::new(AlphabetId::Index(0), 2),
        method,
        &records,
        &labels,
        background,
    )
    .unwrap()
}

#[test]
fn test_fit_scores_observed_kmers() {
    let model = fit(ScoreMethod::Default, None);
    assert_eq!(model.basis().kmers(), ["SS", "VV"]);
    assert_eq!(model.scores.labels(), ["a", "b"]);
    assert_eq!(model.scores.get("a").unwrap().score, vec![-1.0, 1.0]);
    assert_eq!(model.scores.get("b").unwrap().score, vec![1.0, -1.0]);
}

#[test]
fn test_fit_with_background() {
    let background = records(&[("bg1", "AAAA"), ("bg2", "MKVK")]);
    let model = fit(ScoreMethod::Both, Some(&background));

    // VV is present in half the background, SS in none of it
    assert_eq!(model.scores.get("a").unwrap().score, vec![-1.0, 0.5]);

    let registry = AlphabetRegistry::builtin();
    let (records, labels) = training();
    let missing = KmerModel::fit(
        &registry,
        VectorizerConfig::new(AlphabetId::Index(0), 2),
        ScoreMethod::BgOnly,
        &records,
        &labels,
        None,
    );
    assert!(matches!(missing, Err(KmerError::MissingBackground(_))));
}

#[test]
fn test_fit_rejects_label_mismatch() {
    let registry = AlphabetRegistry::builtin();
    let (records, _) = training();
    let result = KmerModel::fit(
        &registry,
        VectorizerConfig::new("hydro", 2),
        ScoreMethod::Default,
        &records,
        &["a".to_string()],
        None,
    );
    assert!(matches!(result, Err(KmerError::ShapeMismatch { .. })));
}

#[test]
fn test_apply_predicts_classes() {
    let registry = AlphabetRegistry::builtin();
    let model = fit(ScoreMethod::Default, None);
    let queries = records(&[
        ("q1", "AAAAA"),
        ("", "AAAA"),
        ("q2", "KKK"),
        ("q3", "MKVK"),
    ]);

    let scores = model.apply(&registry, &queries).unwrap();
    assert_eq!(scores.ids, ["q1", "q2", "q3"]);
    assert_eq!(scores.labels, ["a", "b"]);
    assert_eq!(scores.failures.len(), 1);
    assert_eq!(scores.totals.row(0).to_vec(), vec![1.0, -1.0]);
    assert_eq!(scores.totals.row(1).to_vec(), vec![-1.0, 1.0]);
    // VSVS shares no k-mer with the fitted basis
    assert_eq!(scores.totals.row(2).to_vec(), vec![0.0, 0.0]);

    let predictions = scores.predictions();
    assert_eq!(predictions[0], "a");
    assert_eq!(predictions[1], "b");

    let df = scores.to_dataframe().unwrap();
    assert_eq!(df.shape(), (3, 4));
}

#[test]
fn test_model_round_trip() {
    let model = fit(ScoreMethod::Default, None);
    let mut buffer = Vec::new();
    model.write_to(&mut buffer).unwrap();

    let restored = KmerModel::read_from(buffer.as_slice()).unwrap();
    assert_eq!(restored, model);

    assert!(matches!(
        KmerModel::read_from(&b"not a model"[..]),
        Err(KmerError::Serialization(_))
    ));
}
