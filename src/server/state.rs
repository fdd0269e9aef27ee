//! Application state shared by all handlers

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::catalog::{CatalogSource, FileCatalog};
use crate::config::Config;
use crate::control::{Dispatcher, StatusAggregator, shared};
use crate::pool::{ControlState, WorkerDirectory};
use crate::worker::WorkerClient;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub aggregator: Arc<StatusAggregator>,
    pub config: Arc<RwLock<Config>>,
    /// Where settings changes are saved; None keeps them in memory only
    pub config_path: Option<PathBuf>,
}

impl AppState {
    /// Wire up the control plane from configuration, reading loops from the
    /// configured catalog directory
    pub fn from_config(config: Config, config_path: Option<PathBuf>, client: Arc<dyn WorkerClient>) -> Self {
        let catalog: Arc<dyn CatalogSource> = Arc::new(FileCatalog::new(&config.catalog.dir));
        Self::with_catalog(config, config_path, client, catalog)
    }

    pub fn with_catalog(
        config: Config,
        config_path: Option<PathBuf>,
        client: Arc<dyn WorkerClient>,
        catalog: Arc<dyn CatalogSource>,
    ) -> Self {
        let loops = catalog.load(&config.role);
        let directory = WorkerDirectory::from_specs(&config.workers.pool, &config.workers.host);
        log::info!(
            "Control plane for role {}: {} loops, {} workers",
            config.role,
            loops.len(),
            directory.len()
        );

        let state = shared(ControlState::new(config.role.clone(), loops, directory));
        let dispatcher = Dispatcher::new(state.clone(), client.clone(), catalog, config.dispatch.commit_policy);
        let aggregator = StatusAggregator::new(state, client, config.workers.http().status_timeout);

        Self {
            dispatcher: Arc::new(dispatcher),
            aggregator: Arc::new(aggregator),
            config: Arc::new(RwLock::new(config)),
            config_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::control::lock_state;
    use crate::domain::LoopDef;
    use crate::worker::RecordingWorkerClient;
    use std::time::Duration;

    #[test]
    fn test_with_catalog_builds_state() {
        let catalog = StaticCatalog::new().with_role("FLIGHT", vec![LoopDef::talk("CMD")]);
        let state = AppState::with_catalog(
            Config::default(),
            None,
            Arc::new(RecordingWorkerClient::new()),
            Arc::new(catalog),
        );

        let control = lock_state(state.dispatcher.state());
        assert_eq!(control.role(), "FLIGHT");
        assert_eq!(control.loops().len(), 1);
        assert_eq!(control.directory().len(), 3);
        assert_eq!(state.aggregator.timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_from_config_missing_catalog_dir() {
        let mut config = Config::default();
        config.catalog.dir = PathBuf::from("/nonexistent/voxctl/loops");
        let state = AppState::from_config(config, None, Arc::new(RecordingWorkerClient::new()));
        assert!(lock_state(state.dispatcher.state()).loops().is_empty());
    }
}
