//! Portal errors.

use chanterelle_client::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Session storage error: {0}")]
    Session(String),

    #[error("API client error: {0}")]
    Client(#[from] ClientError),
}

impl From<std::io::Error> for PortalError {
    fn from(e: std::io::Error) -> Self {
        PortalError::Session(e.to_string())
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(e: serde_json::Error) -> Self {
        PortalError::Session(format!("JSON serialization error: {}", e))
    }
}
