//! Error types for voxctl
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in voxctl
#[derive(Debug, Error)]
pub enum VoxError {
    /// Loop name not present in the active catalog
    #[error("Loop not found: {0}")]
    LoopNotFound(String),

    /// Operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Command body could not be turned into a valid command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    /// Loop catalog could not be read or parsed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration could not be loaded or saved
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for voxctl operations
pub type Result<T> = std::result::Result<T, VoxError>;
