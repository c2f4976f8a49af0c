//! Error types for the oxidized-retro frontend

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the frontend
#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Errors opening a core library and binding its entry points
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Core library not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to open core library {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Core library missing required symbol `{0}`")]
    MissingSymbol(&'static str),
}

/// Host-side sequencing bugs. These are fatal: the call is refused before
/// the core is touched, and the caller must not continue the session.
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("{operation} called in phase {phase}")]
    OutOfOrderCall {
        operation: &'static str,
        phase: &'static str,
    },

    #[error("Another core session is already active")]
    SessionAlreadyActive,
}

/// Failures reported by the core itself
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core rejected game image: {0}")]
    GameLoadFailed(PathBuf),

    #[error("Core does not support save states")]
    SaveStateUnsupported,

    #[error("Core failed to serialize {size} bytes")]
    SerializeFailed { size: usize },

    #[error("Core rejected save state buffer of {size} bytes")]
    UnserializeRejected { size: usize },
}

/// Result type alias for frontend operations
pub type Result<T> = std::result::Result<T, FrontendError>;
