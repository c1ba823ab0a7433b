use kmer_features::align::{align, BasisAligner, FillPolicy};
use kmer_features::basis::Basis;
use kmer_features::error::KmerError;
use ndarray::{array, Axis};

fn basis() -> Basis {
    Basis::from_kmers(["AA", "AC", "CA", "CC"])
}

#[test]
fn test_align_onto_own_basis_is_identity() {
    let basis = basis();
    let vector = array![1.0, 2.0, 1.0, 0.0];
    let aligned = align(vector.view(), basis.kmers(), &basis).unwrap();
    assert_eq!(aligned, vector);
}

#[test]
fn test_align_reorders_and_zero_fills() {
    let vector = array![5.0, 3.0, 9.0];
    let aligned = align(vector.view(), &["CC", "AA", "GG"], &basis()).unwrap();
    // GG is outside the target and dropped
    assert_eq!(aligned.to_vec(), vec![3.0, 0.0, 0.0, 5.0]);
}

#[test]
fn test_marker_fill() {
    let aligner = BasisAligner::fit(basis()).with_fill(FillPolicy::Marker(f64::NAN));
    let aligned = aligner.transform(array![4.0].view(), &["AC"]).unwrap();

    assert!(aligned[0].is_nan());
    assert_eq!(aligned[1], 4.0);
    assert!(aligned[2].is_nan());
    assert!(aligned[3].is_nan());
}

#[test]
fn test_length_mismatch_is_rejected() {
    let aligner = BasisAligner::fit(basis());
    let result = aligner.transform(array![1.0, 2.0].view(), &["AA"]);
    assert!(matches!(
        result,
        Err(KmerError::ShapeMismatch {
            expected: 1,
            actual: 2,
            ..
        })
    ));
}

#[test]
fn test_default_fill_is_zero() {
    assert_eq!(FillPolicy::default(), FillPolicy::Zero);
    assert_eq!(BasisAligner::fit(basis()).fill().value(), 0.0);
    assert_eq!(FillPolicy::Marker(-1.0).value(), -1.0);
}

#[test]
fn test_index_map() {
    let aligner = BasisAligner::fit(basis());
    assert_eq!(
        aligner.index_map(&["CA", "AA"]),
        vec![Some(1), None, Some(0), None]
    );
}

#[test]
fn test_transform_matrix_along_either_axis() {
    let aligner = BasisAligner::fit(basis());
    let source = ["CC", "AA"];

    // k-mers as rows, two sequences as columns
    let kmer_rows = array![[1.0, 2.0], [3.0, 4.0]];
    let aligned = aligner
        .transform_matrix(kmer_rows.view(), &source, Axis(0))
        .unwrap();
    assert_eq!(
        aligned,
        array![[3.0, 4.0], [0.0, 0.0], [0.0, 0.0], [1.0, 2.0]]
    );

    // sequences as rows
    let sequence_rows = kmer_rows.t().to_owned();
    let aligned = aligner
        .transform_matrix(sequence_rows.view(), &source, Axis(1))
        .unwrap();
    assert_eq!(aligned, array![[3.0, 0.0, 0.0, 1.0], [4.0, 0.0, 0.0, 2.0]]);

    assert!(aligner
        .transform_matrix(kmer_rows.view(), &["AA"], Axis(0))
        .is_err());
}

#[test]
fn test_transform_matrix_rejects_third_axis() {
    let aligner = BasisAligner::fit(basis());
    let matrix = array![[1.0, 2.0], [3.0, 4.0]];
    let result = aligner.transform_matrix(matrix.view(), &["AA", "AC"], Axis(2));
    assert!(matches!(result, Err(KmerError::InvalidParameter { .. })));
}
