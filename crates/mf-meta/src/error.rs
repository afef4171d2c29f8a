//! Error types for the metadata store.

use thiserror::Error;

/// Metadata store errors.
#[derive(Error, Debug)]
pub enum MetaError {
    /// Failed to open or create the metadata database (M001).
    #[error("[M001] Metadata database connection failed: {0}")]
    ConnectionError(String),

    /// Schema migration failed (M002).
    #[error("[M002] Metadata database migration failed: {0}")]
    MigrationError(String),

    /// SQL execution error inside the metadata database (M003).
    #[error("[M003] Metadata query failed: {0}")]
    QueryError(String),

    /// Transaction management error (M004).
    #[error("[M004] Metadata transaction failed: {0}")]
    TransactionError(String),

    /// The referenced record does not exist (M005).
    #[error("[M005] {entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A unique constraint rejected the write (M006).
    #[error("[M006] Conflicting record: {0}")]
    Conflict(String),

    /// A stored value could not be decoded (M007).
    #[error("[M007] Corrupt {column} value: {message}")]
    Decode { column: &'static str, message: String },
}

/// Result type alias for [`MetaError`].
pub type MetaResult<T> = Result<T, MetaError>;

/// Attach a short description of the failed operation to a DuckDB error,
/// classifying unique-constraint violations as [`MetaError::Conflict`].
pub(crate) trait MetaResultExt<T> {
    fn query_context(self, what: &str) -> MetaResult<T>;
}

impl<T> MetaResultExt<T> for Result<T, duckdb::Error> {
    fn query_context(self, what: &str) -> MetaResult<T> {
        self.map_err(|e| {
            let msg = e.to_string();
            // duckdb::Error does not expose constraint kinds, so match on the
            // message DuckDB emits for PRIMARY KEY / UNIQUE violations.
            if msg.contains("Duplicate key") || msg.contains("unique constraint") {
                MetaError::Conflict(format!("{what}: {msg}"))
            } else {
                MetaError::QueryError(format!("{what}: {msg}"))
            }
        })
    }
}
