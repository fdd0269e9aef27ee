//! Control plane - command dispatch and status aggregation
//!
//! Both halves work over one [`SharedState`]: the dispatcher mutates it
//! through the loop state machine, the aggregator only reads it.

pub mod command;
pub mod dispatcher;
pub mod outcome;
pub mod policy;
pub mod status;

pub use command::{Command, CommandRequest, DeviceDirection};
pub use dispatcher::Dispatcher;
pub use outcome::{CommandOutcome, OpFailure, OutcomeKind, RoleSwitch};
pub use policy::CommitPolicy;
pub use status::StatusAggregator;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::pool::ControlState;

/// Control state behind its single lock
pub type SharedState = Arc<Mutex<ControlState>>;

pub fn shared(state: ControlState) -> SharedState {
    Arc::new(Mutex::new(state))
}

/// Lock the control state. Guards must not be held across an `.await`.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, ControlState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
