//! Relay workers

use serde::{Deserialize, Serialize};

/// Static definition of a worker, as it appears in the pool configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub name: String,
    pub port: u16,
    /// Overrides `workers.host` for this worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

impl WorkerSpec {
    pub fn new(name: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            port,
            host: None,
        }
    }

    /// Base URL of the worker's HTTP interface
    pub fn endpoint(&self, default_host: &str) -> String {
        let host = self.host.as_deref().unwrap_or(default_host);
        format!("http://{}:{}", host, self.port)
    }
}

/// A worker in the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Worker {
    pub name: String,
    pub endpoint: String,
    /// Loop this worker is currently relaying
    pub assigned: Option<String>,
    /// Stamp of the last claim or release (0 = never used)
    pub last_used: u64,
}

impl Worker {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            assigned: None,
            last_used: 0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.assigned.is_none()
    }

    /// Addressing handle for remote calls
    pub fn to_ref(&self) -> WorkerRef {
        WorkerRef {
            name: self.name.clone(),
            endpoint: self.endpoint.clone(),
        }
    }
}

/// Name and endpoint of a worker, detached from the directory
///
/// Remote calls are issued against a `WorkerRef` so the directory lock is
/// never held across the round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerRef {
    pub name: String,
    pub endpoint: String,
}

impl WorkerRef {
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Full URL for a path on this worker
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}
