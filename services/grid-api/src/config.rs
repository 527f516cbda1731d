//! Server configuration from command-line arguments and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Grid API server
#[derive(Parser, Debug, Clone)]
#[command(name = "grid-api")]
#[command(about = "Serves canonical ocean and atmosphere grids over HTTP")]
pub struct ServerConfig {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000", env = "GRID_API_LISTEN_ADDR")]
    pub listen: String,

    /// Directory holding the `<name>_grid.json` records
    #[arg(long, default_value = "data/processed", env = "GRID_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log_level: String,

    /// Number of worker threads
    #[arg(long, env = "GRID_API_WORKER_THREADS")]
    pub worker_threads: Option<usize>,

    /// Timeout for one record read, in milliseconds
    #[arg(long, default_value_t = 5000, env = "GRID_READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// `max-age` of the Cache-Control header on grid responses, in seconds
    #[arg(long, default_value_t = 3600, env = "GRID_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    /// Load every available grid into memory before accepting requests
    #[arg(long, env = "GRID_PRELOAD")]
    pub preload: bool,
}

impl ServerConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
            data_dir: PathBuf::from("data/processed"),
            log_level: "info".to_string(),
            worker_threads: None,
            read_timeout_ms: 5000,
            cache_max_age: 3600,
            preload: false,
        }
    }
}
