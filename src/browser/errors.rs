//! Browser error types

use thiserror::Error;

/// Browser-related errors
#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to start browser engine: {0}")]
    EngineStart(String),

    #[error("Browser engine not started")]
    NotStarted,

    #[error("Failed to create session: {0}")]
    SessionCreation(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
