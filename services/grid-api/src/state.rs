//! Application state and shared resources.

use metrics_exporter_prometheus::PrometheusHandle;
use storage::{GridCache, GridStore};

use crate::config::ServerConfig;

/// Shared application state.
pub struct AppState {
    /// Lazily populated grid records.
    pub cache: GridCache,

    /// `max-age` sent with grid responses.
    pub cache_max_age: u32,

    /// Renders `/metrics`; absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: &ServerConfig, prometheus: Option<PrometheusHandle>) -> Self {
        let store = GridStore::new(&config.data_dir).with_read_timeout(config.read_timeout());
        Self {
            cache: GridCache::new(store),
            cache_max_age: config.cache_max_age,
            prometheus,
        }
    }

    /// State over `store` with default settings and no metrics recorder.
    pub fn with_store(store: GridStore) -> Self {
        Self {
            cache: GridCache::new(store),
            cache_max_age: ServerConfig::default().cache_max_age,
            prometheus: None,
        }
    }
}
