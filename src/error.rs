//! Error types for the cell-freq library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum FreqError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed record for sample '{sample}': {reason}")]
    MalformedRecord { sample: String, reason: String },

    #[error("Sample '{sample}' has a total cell count of zero, cannot compute percentages")]
    DivisionByZero { sample: String },

    #[error("No samples match the cohort filter: {0}")]
    EmptyCohort(String),

    #[error("Population '{population}' cannot be tested: {n_a} responder and {n_b} non-responder observations")]
    InsufficientGroupSize {
        population: String,
        n_a: usize,
        n_b: usize,
    },

    #[error("Unknown column '{0}' in dataset")]
    UnknownColumn(String),

    #[error("Missing column '{0}' in dataset")]
    MissingColumn(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, FreqError>;
