use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TexpandError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A synthetic key event could not be delivered.
    #[error("Injection failed: {0}")]
    Injection(String),

    /// The snippet store could not answer a lookup.
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Invalid keyword: '{0}'")]
    InvalidKeyword(String),

    #[error("Keyboard error: {0}")]
    Keyboard(String),

    #[error("Keyword '{0}' already exists")]
    DuplicateKeyword(String),

    #[error("Snippet '{0}' not found")]
    SnippetNotFound(String),

    #[error("Daemon already running with PID {0}")]
    DaemonAlreadyRunning(u32),

    #[error("Daemon is not running")]
    DaemonNotRunning,

    #[error("Invalid PID in daemon file")]
    InvalidPid,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TexpandError>;
