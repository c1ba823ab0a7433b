use crate::error::{KmerError, Result};
use crate::types::SequenceRecord;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

/// Reads a column as strings, casting numeric columns such as integer ids or
/// class labels
fn string_values(df: &DataFrame, name: &str) -> Result<StringChunked> {
    let column = df
        .column(name)
        .map_err(|e| KmerError::Data(e.to_string()))?
        .cast(&DataType::String)
        .map_err(|e| KmerError::Data(e.to_string()))?;
    let values = column
        .str()
        .map_err(|e| KmerError::Data(e.to_string()))?
        .clone();
    Ok(values)
}

/// Extracts `(id, sequence)` records from a DataFrame.
///
/// # Arguments
/// * `df` - DataFrame holding at least the two named columns
/// * `id_column` - Name of the identifier column (numeric ids are read as strings)
/// * `sequence_column` - Name of the sequence column
///
/// # Returns
/// * `Result<Vec<SequenceRecord>>` - Records in row order, sequences uppercased.
///   Rows with a null identifier or sequence are skipped
///
/// # Errors
/// * Returns `KmerError::Data` if a column is missing or cannot be read as strings
pub fn records_from_dataframe(
    df: &DataFrame,
    id_column: &str,
    sequence_column: &str,
) -> Result<Vec<SequenceRecord>> {
    let ids = string_values(df, id_column)?;
    let sequences = string_values(df, sequence_column)?;

    Ok(ids
        .into_iter()
        .zip(&sequences)
        .filter_map(|(id, sequence)| Some((id?.to_string(), sequence?.to_uppercase())))
        .collect())
}

/// Extracts one column as strings, e.g. class labels, in row order.
///
/// # Errors
/// * Returns `KmerError::Data` if the column is missing, cannot be read as strings or holds nulls
pub fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let values = string_values(df, name)?;
    values
        .into_iter()
        .map(|value| {
            value
                .map(str::to_string)
                .ok_or_else(|| KmerError::Data(format!("null value in column {}", name)))
        })
        .collect()
}

/// Produces `n` shuffled copies of a sequence as negative controls.
///
/// # Arguments
/// * `id` - Identifier of the source sequence
/// * `sequence` - Sequence to shuffle
/// * `n` - Number of copies
/// * `first_residue` - Leading residues kept in place (1 protects an N-terminal M)
/// * `tag_ids` - If true, copies are named `{id}_shuffle_{i}`, otherwise they reuse `id`
/// * `rng` - Random number generator
///
/// # Returns
/// * `Vec<SequenceRecord>` - The shuffled copies; residue composition is preserved
pub fn scramble<R: Rng + ?Sized>(
    id: &str,
    sequence: &str,
    n: usize,
    first_residue: usize,
    tag_ids: bool,
    rng: &mut R,
) -> Vec<SequenceRecord> {
    let residues: Vec<char> = sequence.chars().collect();
    let split = first_residue.min(residues.len());
    let (fixed, rest) = residues.split_at(split);
    let mut rest = rest.to_vec();

    (0..n)
        .map(|i| {
            rest.shuffle(rng);
            let shuffled: String = fixed.iter().chain(rest.iter()).collect();
            let id = if tag_ids {
                format!("{}_shuffle_{}", id, i)
            } else {
                id.to_string()
            };
            (id, shuffled)
        })
        .collect()
}
