//! Status surface payload

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::LoopState;

/// Live participant counts and loop states, keyed by loop name
///
/// Serializes to `{"user_counts": {...}, "states": {...}}` with states as
/// integer codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub user_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub states: BTreeMap<String, LoopState>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay another report on top of this one; entries in `other` win
    pub fn overlay(&mut self, other: StatusReport) {
        self.user_counts.extend(other.user_counts);
        self.states.extend(other.states);
    }

    pub fn state_of(&self, loop_name: &str) -> LoopState {
        self.states.get(loop_name).copied().unwrap_or_default()
    }

    pub fn count_of(&self, loop_name: &str) -> u64 {
        self.user_counts.get(loop_name).copied().unwrap_or(0)
    }
}
