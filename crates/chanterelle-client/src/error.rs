//! Site API client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an `{error, code}` body.
    #[error("{error}")]
    Rejected {
        status: u16,
        error: String,
        code: Option<String>,
    },

    /// The API failed without a readable error body.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported contact list version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// The `error` text the server sent, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Rejected { error, .. } if !error.is_empty() => Some(error),
            _ => None,
        }
    }

    /// HTTP status of a failed response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Rejected { status, .. } | ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
