//! # Scribe Errors
//!
//! User-facing failure taxonomy. Internals work with `anyhow::Result` and
//! convert into a `ScribeError` at the boundary of the operation that failed.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    /// No credential in the credential file, the environment, or the prompt.
    #[error("Missing API key: set {env_var}, add it to {}, or enter it when prompted", path.display())]
    MissingCredential { env_var: String, path: PathBuf },

    /// Rejected before any engine call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The orchestration engine failed; carries the underlying message.
    #[error("Error generating article: {0}")]
    Generation(String),

    /// A download encoding failed. The displayed article stays valid.
    #[error("Export failed: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScribeError {
    /// Flatten an `anyhow` chain into a `Generation` error, keeping every cause.
    pub fn generation(err: &anyhow::Error) -> Self {
        ScribeError::Generation(format!("{:#}", err))
    }

    pub fn export(err: impl std::fmt::Display) -> Self {
        ScribeError::Export(err.to_string())
    }
}

pub type ScribeResult<T> = Result<T, ScribeError>;
