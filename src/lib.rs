//! voxctl - voice loop control plane
//!
//! Multiplexes a small fixed pool of audio relay workers across many voice
//! loops. At most one loop system-wide may be in TALK; workers are handed out
//! least-recently-used first and released when their loop goes OFF.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod control;
pub mod domain;
pub mod error;
pub mod pool;
pub mod server;
pub mod worker;

pub use error::{Result, VoxError};

/// Crate version reported by the health endpoint
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
