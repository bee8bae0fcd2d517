//! Error types for the paired-diff library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum PairedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insufficient data for '{category}': {n} complete pair(s), at least 2 required")]
    InsufficientData { category: String, n: usize },

    #[error("Zero variance in differences for '{category}'")]
    ZeroVariance { category: String },

    #[error("Invalid value '{value}' at line {line}, column {col}")]
    InvalidValue {
        value: String,
        line: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Missing column '{0}' in mapping file")]
    MissingColumn(String),

    #[error("Invalid variable type for column '{column}': {reason}")]
    InvalidVariableType { column: String, reason: String },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Plotting error: {0}")]
    Plot(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PairedError>;
