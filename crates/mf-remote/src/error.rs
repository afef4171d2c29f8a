//! Error types for mf-remote

use thiserror::Error;

/// Errors from the job scheduler and experiment tracker clients.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport failure (R001)
    #[error("[R001] HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error status (R002)
    #[error("[R002] {endpoint} returned HTTP {status}{}: {message}", .error_code.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
    Api {
        endpoint: String,
        status: u16,
        error_code: Option<String>,
        message: String,
    },

    /// The requested remote entity does not exist (R003)
    #[error("[R003] {0} not found")]
    NotFound(String),

    /// The response body did not have the expected shape (R004)
    #[error("[R004] Malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    /// The request URL could not be built (R005)
    #[error("[R005] Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl RemoteError {
    /// The API error code, when the server sent one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            RemoteError::Api { error_code, .. } => error_code.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for RemoteError
pub type RemoteResult<T> = Result<T, RemoteError>;
