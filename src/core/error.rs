//! Error types for random-feature experiments

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RFError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown feature type {0}")]
    UnknownFeatureType(char),

    #[error("Unknown kernel type {0}")]
    UnknownKernel(char),

    #[error("Optimization failed: {0}")]
    OptimizationError(String),

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Empty dataset")]
    EmptyDataset,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, RFError>;
