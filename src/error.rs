use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KmerError>;

#[derive(Error, Debug)]
pub enum KmerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid parameter: {name} = {value}, {message}")]
    InvalidParameter {
        name: String,
        value: String,
        message: String,
    },

    #[error("Unknown alphabet: {0}")]
    UnknownAlphabet(String),

    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Background probabilities are required for score method {0}")]
    MissingBackground(String),

    #[error("At least two distinct class labels are required, found {0}")]
    InsufficientClasses(usize),

    #[error("Feature space is empty after filtering")]
    EmptyFeatureSpace,

    #[error("Data error: {0}")]
    Data(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl KmerError {
    /// Create a new InvalidParameter error
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: impl ToString,
        message: impl Into<String>,
    ) -> Self {
        KmerError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            message: message.into(),
        }
    }

    /// Create a new ShapeMismatch error
    pub fn shape_mismatch(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        KmerError::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}

impl From<polars::prelude::PolarsError> for KmerError {
    fn from(e: polars::prelude::PolarsError) -> Self {
        KmerError::Data(e.to_string())
    }
}
