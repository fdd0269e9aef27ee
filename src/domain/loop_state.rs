//! Per-loop state machine values
//!
//! `LoopState` travels over the wire as the integer codes 0/1/2; everywhere
//! else it is the enum.

use serde::{Deserialize, Serialize};

/// State of a single loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum LoopState {
    /// Not joined; no worker assigned
    #[default]
    Off,
    /// Joined and muted
    Listen,
    /// Joined and unmuted; at most one loop system-wide
    Talk,
}

impl LoopState {
    /// Integer code used by the status surface and the workers
    pub fn code(self) -> i64 {
        match self {
            LoopState::Off => 0,
            LoopState::Listen => 1,
            LoopState::Talk => 2,
        }
    }

    /// Decode a wire code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(LoopState::Off),
            1 => Some(LoopState::Listen),
            2 => Some(LoopState::Talk),
            _ => None,
        }
    }

    pub fn is_off(self) -> bool {
        self == LoopState::Off
    }
}

impl TryFrom<i64> for LoopState {
    type Error = String;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown loop state code: {}", code))
    }
}

impl From<LoopState> for i64 {
    fn from(state: LoopState) -> Self {
        state.code()
    }
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LoopState::Off => "OFF",
            LoopState::Listen => "LISTEN",
            LoopState::Talk => "TALK",
        };
        write!(f, "{}", name)
    }
}

/// State record for one loop in the Loop State Table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopRecord {
    pub state: LoopState,
    /// Name of the worker relaying this loop; present iff `state != Off`
    pub assigned_worker: Option<String>,
}

impl LoopRecord {
    /// A fresh OFF record
    pub fn off() -> Self {
        Self::default()
    }

    pub fn with_worker(state: LoopState, worker: impl Into<String>) -> Self {
        Self {
            state,
            assigned_worker: Some(worker.into()),
        }
    }

    /// Whether `assigned_worker` agrees with `state`
    pub fn is_consistent(&self) -> bool {
        self.state.is_off() == self.assigned_worker.is_none()
    }
}
