//! Error types shared by the capability traits

use thiserror::Error;

/// Errors surfaced by capability implementations
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials or endpoints are missing
    #[error("Not configured: {0}")]
    Configuration(String),

    /// Remote service answered with a non-success status
    #[error("Upstream returned HTTP {status}")]
    Upstream { status: u16, detail: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {0}ms")]
    Timeout(u64),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// HTTP status of an upstream failure, if there was one
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
