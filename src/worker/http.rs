//! HTTP implementation of the worker client

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::{WorkerClient, WorkerError, WorkerOp, WorkerResult};
use crate::domain::{LoopState, StatusReport, WorkerRef};
use crate::error::{Result, VoxError};

/// Timeouts for worker calls
#[derive(Debug, Clone)]
pub struct HttpWorkerConfig {
    /// Budget for one mutating call (join, mute, ...)
    pub command_timeout: Duration,
    /// Budget for one status query; keep well under the dashboard poll interval
    pub status_timeout: Duration,
}

impl Default for HttpWorkerConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_millis(2000),
            status_timeout: Duration::from_millis(500),
        }
    }
}

/// Worker client speaking the relay's HTTP interface
pub struct HttpWorkerClient {
    client: Client,
    config: HttpWorkerConfig,
}

/// Status body as sent by a worker
///
/// Both maps are decoded entry by entry: a malformed count or an unknown
/// state code drops that entry, not the whole report.
#[derive(Debug, Default, Deserialize)]
struct WireStatus {
    #[serde(default)]
    user_counts: HashMap<String, Value>,
    #[serde(default)]
    states: HashMap<String, Value>,
}

impl WireStatus {
    fn into_report(self, worker: &str) -> StatusReport {
        let mut report = StatusReport::new();
        for (loop_name, count) in self.user_counts {
            match count.as_u64() {
                Some(count) => {
                    report.user_counts.insert(loop_name, count);
                }
                None => log::debug!("Worker {} reported bad count {} for {}", worker, count, loop_name),
            }
        }
        for (loop_name, code) in self.states {
            match code.as_i64().and_then(LoopState::from_code) {
                Some(state) => {
                    report.states.insert(loop_name, state);
                }
                None => log::debug!("Worker {} reported unknown state {} for {}", worker, code, loop_name),
            }
        }
        report
    }
}

impl HttpWorkerClient {
    pub fn new(config: HttpWorkerConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.command_timeout)
            .build()
            .map_err(|e| VoxError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpWorkerConfig {
        &self.config
    }

    fn map_error(err: reqwest::Error, timeout: Duration) -> WorkerError {
        if err.is_timeout() {
            WorkerError::Timeout(timeout.as_millis() as u64)
        } else if err.is_decode() {
            WorkerError::Decode(err.to_string())
        } else {
            WorkerError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl WorkerClient for HttpWorkerClient {
    async fn send(&self, worker: &WorkerRef, op: &WorkerOp) -> WorkerResult<()> {
        let timeout = self.config.command_timeout;
        let mut request = self.client.post(worker.url(op.kind())).timeout(timeout);
        if let Some(body) = op.body() {
            request = request.json(&body);
        }

        log::debug!("-> {} {}", worker.name, op);
        let response = request.send().await.map_err(|e| Self::map_error(e, timeout))?;
        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn status(&self, worker: &WorkerRef) -> WorkerResult<StatusReport> {
        let timeout = self.config.status_timeout;
        let response = self
            .client
            .get(worker.url("status"))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WorkerError::Status(status.as_u16()));
        }

        let wire: WireStatus = response.json().await.map_err(|e| Self::map_error(e, timeout))?;
        Ok(wire.into_report(&worker.name))
    }
}
