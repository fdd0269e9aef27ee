//! Remote worker interface
//!
//! Workers are external processes that do the actual audio relay. The
//! control plane only drives them through [`WorkerClient`]:
//! - ops: the remote operations a worker understands
//! - client: the trait and its error type
//! - http: the production HTTP implementation
//! - recording: an in-memory implementation that records every call

pub mod client;
pub mod http;
pub mod ops;
pub mod recording;

pub use client::{WorkerClient, WorkerError, WorkerResult};
pub use http::{HttpWorkerClient, HttpWorkerConfig};
pub use ops::WorkerOp;
pub use recording::{RecordedCall, RecordingWorkerClient};
