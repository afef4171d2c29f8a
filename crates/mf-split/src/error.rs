//! Error types for mf-split

use thiserror::Error;

/// Dataset split validation errors.
///
/// Raised before any SQL is generated, so none of them has a remote side
/// effect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    /// Unknown source type (V001)
    #[error("[V001] Unsupported source type '{0}' (expected static_table, dynamic_table or feature_lookup)")]
    UnsupportedSourceType(String),

    /// Unknown evaluation type (V002)
    #[error("[V002] Unsupported evaluation type '{0}' (expected random, table or timestamp)")]
    UnsupportedEvaluationType(String),

    /// A split parameter is missing or out of range (V003)
    #[error("[V003] Invalid split parameter '{field}': {message}")]
    InvalidSplitParameter {
        field: &'static str,
        message: String,
    },

    /// A field required for generation is empty (V004)
    #[error("[V004] Missing required field '{field}'")]
    MissingRequiredField { field: &'static str },

    /// A table reference is not a 1-3 part SQL object name (V005)
    #[error("[V005] Invalid table reference '{reference}': {message}")]
    InvalidTableReference { reference: String, message: String },

    /// The dataset name cannot become part of a table name (V006)
    #[error("[V006] Dataset name '{0}' must use only letters, digits, underscores and spaces, and must not start with a digit")]
    InvalidDatasetName(String),
}

/// Result type alias for SplitError
pub type SplitResult<T> = Result<T, SplitError>;
