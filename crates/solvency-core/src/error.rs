//! Error types for Solvency

use thiserror::Error;

use crate::validate::ValidationErrors;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Failed to fetch {what}: {details}")]
    Fetch { what: &'static str, details: String },

    #[error("Analysis failed: {details}")]
    Analysis {
        status: Option<u16>,
        details: String,
    },

    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    #[error("No active session")]
    NoSession,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// HTTP status code behind this error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Analysis { status, .. } => *status,
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Human-readable details without the category prefix
    ///
    /// Server-provided messages are returned as-is so they can be shown
    /// under a summary line.
    pub fn details(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Auth(details) => details.clone(),
            Error::Fetch { details, .. } => details.clone(),
            Error::Analysis { details, .. } => details.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
