//! In-memory worker client that records every call
//!
//! Used by tests and by `voxctl serve --dry-run` to exercise the control plane
//! without live workers. Calls from all workers go into one ordered log so
//! cross-worker ordering can be checked.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use super::{WorkerClient, WorkerError, WorkerOp, WorkerResult};
use crate::domain::{StatusReport, WorkerRef};

/// One recorded operation
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub worker: String,
    pub op: WorkerOp,
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<RecordedCall>,
    status_queries: Vec<String>,
    failing_workers: HashSet<String>,
    failing_ops: HashSet<(String, &'static str)>,
    reports: HashMap<String, StatusReport>,
    delays: HashMap<String, Duration>,
}

#[derive(Debug, Default)]
pub struct RecordingWorkerClient {
    inner: Mutex<Inner>,
}

impl RecordingWorkerClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call to `worker` fails with a transport error
    pub fn fail_worker(&self, worker: &str) {
        self.lock().failing_workers.insert(worker.to_string());
    }

    /// Calls of one kind (e.g. "talk") to `worker` fail
    pub fn fail_op(&self, worker: &str, kind: &'static str) {
        self.lock().failing_ops.insert((worker.to_string(), kind));
    }

    /// Clear all injected failures
    pub fn heal(&self) {
        let mut inner = self.lock();
        inner.failing_workers.clear();
        inner.failing_ops.clear();
    }

    /// Report returned by `status()` for `worker`
    pub fn set_report(&self, worker: &str, report: StatusReport) {
        self.lock().reports.insert(worker.to_string(), report);
    }

    /// Delay every call to `worker`
    pub fn set_delay(&self, worker: &str, delay: Duration) {
        self.lock().delays.insert(worker.to_string(), delay);
    }

    /// All recorded operations, in issue order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Operations issued to one worker
    pub fn ops_for(&self, worker: &str) -> Vec<WorkerOp> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.worker == worker)
            .map(|c| c.op.clone())
            .collect()
    }

    /// Index of the first call matching `worker` and `op`
    pub fn position(&self, worker: &str, op: &WorkerOp) -> Option<usize> {
        self.lock().calls.iter().position(|c| c.worker == worker && c.op == *op)
    }

    /// Workers queried for status, in query order
    pub fn status_queries(&self) -> Vec<String> {
        self.lock().status_queries.clone()
    }

    /// Forget recorded calls (injected behavior stays)
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.calls.clear();
        inner.status_queries.clear();
    }

    fn delay_for(&self, worker: &str) -> Option<Duration> {
        self.lock().delays.get(worker).copied()
    }
}

#[async_trait]
impl WorkerClient for RecordingWorkerClient {
    async fn send(&self, worker: &WorkerRef, op: &WorkerOp) -> WorkerResult<()> {
        let fails = {
            let mut inner = self.lock();
            inner.calls.push(RecordedCall {
                worker: worker.name.clone(),
                op: op.clone(),
            });
            inner.failing_workers.contains(&worker.name)
                || inner.failing_ops.contains(&(worker.name.clone(), op.kind()))
        };

        if let Some(delay) = self.delay_for(&worker.name) {
            tokio::time::sleep(delay).await;
        }

        if fails {
            return Err(WorkerError::Transport(format!("{} unreachable", worker.name)));
        }
        Ok(())
    }

    async fn status(&self, worker: &WorkerRef) -> WorkerResult<StatusReport> {
        let (fails, report) = {
            let mut inner = self.lock();
            inner.status_queries.push(worker.name.clone());
            (
                inner.failing_workers.contains(&worker.name),
                inner.reports.get(&worker.name).cloned().unwrap_or_default(),
            )
        };

        if let Some(delay) = self.delay_for(&worker.name) {
            tokio::time::sleep(delay).await;
        }

        if fails {
            return Err(WorkerError::Transport(format!("{} unreachable", worker.name)));
        }
        Ok(report)
    }
}
