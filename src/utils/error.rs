use asana::{AsanaError, FilterError};
use thiserror::Error;

/// Errors surfaced by the command-line front end
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Asana(#[from] AsanaError),

    #[error("invalid filter expression: {0}")]
    Filter(#[from] FilterError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("no access token: pass --token or set ASANA_PERSONAL_ACCESS_TOKEN")]
    MissingToken,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;
