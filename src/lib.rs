//! Reduced-alphabet k-mer features for biological sequences: alphabet reduction,
//! basis enumeration, vectorization, basis alignment, feature matrices and
//! per-class k-mer scoring

pub mod align;
pub mod alphabet;
pub mod basis;
pub mod error;
pub mod matrix;
pub mod model;
pub mod score;
pub mod sequence;
pub mod types;
pub mod vectorize;
pub mod walk;
