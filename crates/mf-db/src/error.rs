//! Error types for mf-db

use thiserror::Error;

/// Warehouse operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Warehouse connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// HTTP transport error (D003)
    #[error("[D003] Warehouse request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The warehouse answered with something we cannot interpret (D004)
    #[error("[D004] Unexpected warehouse response: {0}")]
    UnexpectedResponse(String),

    /// Mutex poisoned (D005)
    #[error("[D005] Warehouse mutex poisoned: {0}")]
    MutexPoisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::ExecutionError(err.to_string())
    }
}
