//! Domain types for voxctl
//!
//! This module contains all core domain types:
//! - LoopDef: an immutable loop definition from the active role's catalog
//! - LoopState / LoopRecord: per-loop OFF/LISTEN/TALK state and its worker
//! - Worker / WorkerSpec: a relay worker in the pool and its static definition
//! - StatusReport: merged live counts and states for the status surface

pub mod loop_def;
pub mod loop_state;
pub mod status;
pub mod worker;

pub use loop_def::LoopDef;
pub use loop_state::{LoopRecord, LoopState};
pub use status::StatusReport;
pub use worker::{Worker, WorkerRef, WorkerSpec};
