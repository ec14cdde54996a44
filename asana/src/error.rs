//! Error types for the asana crate

use thiserror::Error;

/// Errors returned by the Asana client
#[derive(Debug, Error)]
pub enum AsanaError {
    /// The HTTP request itself failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Asana answered with an error status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The body did not decode into the expected shape
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    /// A response that must carry a sync token came back without one
    #[error("response for resource {0} carried no sync token")]
    MissingSyncToken(String),

    /// Client construction failed
    #[error("configuration error: {0}")]
    Config(String),

    /// The caller built a request the API cannot accept
    #[error("validation error: {0}")]
    Validation(String),
}

impl AsanaError {
    /// HTTP status of an API error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            AsanaError::Api { status, .. } => Some(*status),
            AsanaError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, AsanaError>;
