//! Commit policy for transitions whose remote calls fail

use serde::{Deserialize, Serialize};

/// What to do with local state when a remote call of a transition fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Commit as if every call succeeded and report the failures
    #[default]
    Optimistic,
    /// Commit only transitions whose calls all succeeded. `off` still
    /// always commits.
    FailClosed,
}

impl CommitPolicy {
    pub fn commits_on_failure(self) -> bool {
        self == CommitPolicy::Optimistic
    }
}
