//! Results of commands

use serde::{Deserialize, Serialize};

use crate::domain::LoopState;
use crate::worker::{WorkerError, WorkerOp};

/// Overall result of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// Transition committed, every remote call succeeded
    Ok,
    /// Valid request with nothing to do
    Unchanged,
    /// No idle worker for OFF -> LISTEN
    Busy,
    /// The loop lacks the capability for the request
    Rejected,
    /// Committed, but some remote calls failed
    PartialFailure,
    /// Nothing committed because remote calls failed
    Failed,
}

/// One failed remote call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpFailure {
    pub worker: String,
    pub op: String,
    pub error: String,
}

impl OpFailure {
    pub fn new(worker: &str, op: &WorkerOp, error: &WorkerError) -> Self {
        Self {
            worker: worker.to_string(),
            op: op.to_string(),
            error: error.to_string(),
        }
    }
}

/// Acknowledgement of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutcome {
    pub result: OutcomeKind,
    #[serde(rename = "loop", default, skip_serializing_if = "Option::is_none")]
    pub loop_name: Option<String>,
    /// Loop state after the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<LoopState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<OpFailure>,
}

impl CommandOutcome {
    fn base(result: OutcomeKind, loop_name: Option<&str>, state: Option<LoopState>) -> Self {
        Self {
            result,
            loop_name: loop_name.map(str::to_string),
            state,
            worker: None,
            reason: None,
            failures: Vec::new(),
        }
    }

    /// Committed transition; `ok` or `partial_failure` depending on failures
    pub fn committed(loop_name: &str, state: LoopState, worker: Option<&str>, failures: Vec<OpFailure>) -> Self {
        let result = if failures.is_empty() {
            OutcomeKind::Ok
        } else {
            OutcomeKind::PartialFailure
        };
        Self {
            worker: worker.map(str::to_string),
            failures,
            ..Self::base(result, Some(loop_name), Some(state))
        }
    }

    pub fn unchanged(loop_name: &str, state: LoopState) -> Self {
        Self::base(OutcomeKind::Unchanged, Some(loop_name), Some(state))
    }

    pub fn busy(loop_name: &str) -> Self {
        Self {
            reason: Some("no idle worker".to_string()),
            ..Self::base(OutcomeKind::Busy, Some(loop_name), Some(LoopState::Off))
        }
    }

    pub fn rejected(loop_name: &str, state: LoopState, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::base(OutcomeKind::Rejected, Some(loop_name), Some(state))
        }
    }

    /// Aborted transition; `state` is the unchanged state
    pub fn failed(loop_name: &str, state: LoopState, failures: Vec<OpFailure>) -> Self {
        Self {
            failures,
            ..Self::base(OutcomeKind::Failed, Some(loop_name), Some(state))
        }
    }

    /// Result of a pool-wide broadcast over `attempted` workers
    pub fn broadcast(attempted: usize, failures: Vec<OpFailure>) -> Self {
        let result = match failures.len() {
            0 => OutcomeKind::Ok,
            n if n == attempted => OutcomeKind::Failed,
            _ => OutcomeKind::PartialFailure,
        };
        Self {
            failures,
            ..Self::base(result, None, None)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result == OutcomeKind::Ok
    }
}

/// Result of switching the active role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSwitch {
    pub role: String,
    /// Number of loops in the new catalog
    pub loops: usize,
    /// Workers that were told to leave their old loops
    pub released: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<OpFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> OpFailure {
        OpFailure::new("BOT1", &WorkerOp::Mute, &WorkerError::Timeout(2000))
    }

    #[test]
    fn test_committed_kinds() {
        let ok = CommandOutcome::committed("CMD", LoopState::Listen, Some("BOT1"), vec![]);
        assert!(ok.is_ok());
        assert_eq!(ok.worker.as_deref(), Some("BOT1"));

        let partial = CommandOutcome::committed("CMD", LoopState::Listen, Some("BOT1"), vec![failure()]);
        assert_eq!(partial.result, OutcomeKind::PartialFailure);
    }

    #[test]
    fn test_broadcast_kinds() {
        assert_eq!(CommandOutcome::broadcast(3, vec![]).result, OutcomeKind::Ok);
        assert_eq!(CommandOutcome::broadcast(3, vec![failure()]).result, OutcomeKind::PartialFailure);
        assert_eq!(CommandOutcome::broadcast(1, vec![failure()]).result, OutcomeKind::Failed);
        assert_eq!(CommandOutcome::broadcast(0, vec![]).result, OutcomeKind::Ok);
    }

    #[test]
    fn test_busy_json() {
        let json = serde_json::to_value(CommandOutcome::busy("AUX")).unwrap();
        assert_eq!(json["result"], "busy");
        assert_eq!(json["loop"], "AUX");
        assert_eq!(json["state"], 0);
        assert!(json.get("failures").is_none());
    }

    #[test]
    fn test_failure_description() {
        let f = failure();
        assert_eq!(f.op, "mute()");
        assert_eq!(f.error, "timed out after 2000ms");
        let json = serde_json::to_value(CommandOutcome::failed("CMD", LoopState::Talk, vec![f])).unwrap();
        assert_eq!(json["result"], "failed");
        assert_eq!(json["failures"][0]["worker"], "BOT1");
    }
}
