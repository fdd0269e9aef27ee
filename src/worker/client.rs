//! Worker client trait and error type

use async_trait::async_trait;
use thiserror::Error;

use super::WorkerOp;
use crate::domain::{StatusReport, WorkerRef};

/// Failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("worker returned HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),
}

pub type WorkerResult<T> = std::result::Result<T, WorkerError>;

/// Capability set of a relay worker
///
/// Implementations issue exactly one remote call per method and never retry.
#[async_trait]
pub trait WorkerClient: Send + Sync {
    /// Issue one operation
    async fn send(&self, worker: &WorkerRef, op: &WorkerOp) -> WorkerResult<()>;

    /// Live participant counts and loop states as reported by the worker
    async fn status(&self, worker: &WorkerRef) -> WorkerResult<StatusReport>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(WorkerError::Timeout(500).to_string(), "timed out after 500ms");
        assert_eq!(WorkerError::Status(503).to_string(), "worker returned HTTP 503");
        assert_eq!(
            WorkerError::Transport("connection refused".to_string()).to_string(),
            "transport error: connection refused"
        );
    }
}
