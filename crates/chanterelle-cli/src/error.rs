//! CLI error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("API client error: {0}")]
    Client(#[from] chanterelle_client::ClientError),

    #[error("{0}")]
    Portal(#[from] chanterelle_portal::PortalError),

    /// A flow finished without success; the text is shown as is.
    #[error("{0}")]
    Rejected(String),

    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),
}

/// Result type alias for CLI errors.
pub type AppResult<T> = Result<T, AppError>;
