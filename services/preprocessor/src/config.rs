//! Download configuration.
//!
//! Read from the `downloads` key of the same YAML file as the pipeline
//! jobs:
//!
//! ```yaml
//! downloads:
//!   - grid: current
//!     url: https://example.org/cmems_currents.nc
//!     file_name: cmems_currents.nc
//!     token_env: CMEMS_TOKEN
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use grid_common::GridName;
use serde::Deserialize;

/// One raw file to fetch into the raw directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DownloadRequest {
    pub grid: GridName,
    pub url: String,

    /// Destination name inside the raw directory.
    pub file_name: String,

    /// Environment variable holding a bearer token, if the provider needs one.
    #[serde(default)]
    pub token_env: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcquireConfig {
    #[serde(default)]
    pub downloads: Vec<DownloadRequest>,
}

impl AcquireConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid download config")
    }

    /// Load from `path`; no file means nothing to download.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                Self::from_yaml(&text)
            }
            _ => Ok(Self::default()),
        }
    }
}
