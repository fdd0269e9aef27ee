//! Status aggregation across the worker pool
//!
//! Starts from the locally known state of every catalog loop and overlays
//! what each worker reports. Workers are queried concurrently, each under its
//! own timeout; a worker that errors or times out simply contributes nothing.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::{SharedState, lock_state};
use crate::domain::StatusReport;
use crate::worker::WorkerClient;

pub struct StatusAggregator {
    state: SharedState,
    client: Arc<dyn WorkerClient>,
    timeout: Duration,
}

impl StatusAggregator {
    pub fn new(state: SharedState, client: Arc<dyn WorkerClient>, timeout: Duration) -> Self {
        Self { state, client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Merged status of every loop.
    ///
    /// Reports are overlaid in pool order, so if two workers claim the same
    /// loop the later worker in the pool wins.
    pub async fn collect(&self) -> StatusReport {
        let (mut report, workers) = {
            let state = lock_state(&self.state);
            (state.local_report(), state.directory().refs())
        };

        let queries = workers.iter().map(|worker| async move {
            let result = tokio::time::timeout(self.timeout, self.client.status(worker)).await;
            (worker, result)
        });

        for (worker, result) in join_all(queries).await {
            match result {
                Ok(Ok(worker_report)) => report.overlay(worker_report),
                Ok(Err(e)) => log::debug!("Status from {} failed: {}", worker.name, e),
                Err(_) => log::debug!("Status from {} timed out after {:?}", worker.name, self.timeout),
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::shared;
    use crate::domain::{LoopDef, LoopState, WorkerSpec};
    use crate::pool::{ControlState, WorkerDirectory};
    use crate::worker::RecordingWorkerClient;

    fn setup(timeout_ms: u64) -> (StatusAggregator, SharedState, Arc<RecordingWorkerClient>) {
        let specs = vec![
            WorkerSpec::new("BOT1", 6001),
            WorkerSpec::new("BOT2", 6002),
            WorkerSpec::new("BOT3", 6003),
        ];
        let state = shared(ControlState::new(
            "FLIGHT",
            vec![LoopDef::talk("CMD"), LoopDef::listen_only("OBS")],
            WorkerDirectory::from_specs(&specs, "127.0.0.1"),
        ));
        let client = Arc::new(RecordingWorkerClient::new());
        let aggregator = StatusAggregator::new(state.clone(), client.clone(), Duration::from_millis(timeout_ms));
        (aggregator, state, client)
    }

    fn report(counts: &[(&str, u64)], states: &[(&str, LoopState)]) -> StatusReport {
        let mut report = StatusReport::new();
        for (name, count) in counts {
            report.user_counts.insert(name.to_string(), *count);
        }
        for (name, state) in states {
            report.states.insert(name.to_string(), *state);
        }
        report
    }

    #[tokio::test]
    async fn test_defaults_from_local_state() {
        let (aggregator, state, client) = setup(500);
        {
            let mut state = lock_state(&state);
            let worker = state.claim_idle("CMD").unwrap();
            state.commit("CMD", LoopState::Listen, &worker.name).unwrap();
        }

        let merged = aggregator.collect().await;
        assert_eq!(merged.state_of("CMD"), LoopState::Listen);
        assert_eq!(merged.state_of("OBS"), LoopState::Off);
        assert_eq!(merged.count_of("CMD"), 0);
        assert_eq!(merged.user_counts.len(), 2);
        assert_eq!(client.status_queries().len(), 3);
    }

    #[tokio::test]
    async fn test_worker_reports_overlay_local_state() {
        let (aggregator, _, client) = setup(500);
        client.set_report("BOT2", report(&[("CMD", 5)], &[("CMD", LoopState::Talk)]));

        let merged = aggregator.collect().await;
        assert_eq!(merged.count_of("CMD"), 5);
        assert_eq!(merged.state_of("CMD"), LoopState::Talk);
        assert_eq!(merged.count_of("OBS"), 0);
    }

    #[tokio::test]
    async fn test_later_worker_wins_conflicts() {
        let (aggregator, _, client) = setup(500);
        client.set_report("BOT1", report(&[("OBS", 1)], &[("OBS", LoopState::Listen)]));
        client.set_report("BOT3", report(&[("OBS", 7)], &[("OBS", LoopState::Talk)]));

        let merged = aggregator.collect().await;
        assert_eq!(merged.count_of("OBS"), 7);
        assert_eq!(merged.state_of("OBS"), LoopState::Talk);
    }

    #[tokio::test]
    async fn test_failed_worker_contributes_nothing() {
        let (aggregator, _, client) = setup(500);
        client.set_report("BOT1", report(&[("CMD", 9)], &[("CMD", LoopState::Talk)]));
        client.fail_worker("BOT1");
        client.set_report("BOT2", report(&[("OBS", 2)], &[]));

        let merged = aggregator.collect().await;
        assert_eq!(merged.count_of("CMD"), 0);
        assert_eq!(merged.state_of("CMD"), LoopState::Off);
        assert_eq!(merged.count_of("OBS"), 2);
    }

    #[tokio::test]
    async fn test_slow_workers_are_bounded_by_timeout() {
        let (aggregator, _, client) = setup(50);
        client.set_delay("BOT1", Duration::from_secs(5));
        client.set_delay("BOT2", Duration::from_secs(5));
        client.set_report("BOT3", report(&[("CMD", 4)], &[]));

        let started = std::time::Instant::now();
        let merged = aggregator.collect().await;
        // Queries run concurrently, so total latency is one timeout, not two
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(merged.count_of("CMD"), 4);
    }

    #[tokio::test]
    async fn test_reports_for_unknown_loops_pass_through() {
        let (aggregator, _, client) = setup(500);
        client.set_report("BOT1", report(&[("GHOST", 1)], &[("GHOST", LoopState::Listen)]));

        let merged = aggregator.collect().await;
        assert_eq!(merged.count_of("GHOST"), 1);
        assert_eq!(merged.state_of("GHOST"), LoopState::Listen);
    }
}
