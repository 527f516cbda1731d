//! Pipeline configuration, loaded from YAML with built-in defaults.
//!
//! ```yaml
//! raw_dir: data/raw
//! output_dir: data/processed
//! jobs:
//!   - name: current
//!     source: cmems_currents.nc
//!     variables: [uo, vo]
//!   - name: landmask
//!     source: era5_landmask.nc
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use grid_common::GridName;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::encode::LANDMASK_ALIASES;
use crate::error::{PipelineError, Result};
use crate::pipeline::{GridJob, JobKind};

/// Configuration for a preprocessing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding the raw provider files.
    pub raw_dir: PathBuf,

    /// Directory the `<name>_grid.json` records are written to.
    pub output_dir: PathBuf,

    pub jobs: Vec<JobConfig>,
}

/// One job entry. `source` is relative to `raw_dir` unless absolute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    pub name: GridName,
    pub source: PathBuf,

    /// Variables to encode; for the land mask, the names to try instead of
    /// the defaults.
    #[serde(default)]
    pub variables: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let job = |name, source: &str, variables: &[&str]| JobConfig {
            name,
            source: PathBuf::from(source),
            variables: variables.iter().map(|v| v.to_string()).collect(),
        };

        Self {
            raw_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/processed"),
            jobs: vec![
                job(GridName::Current, "cmems_currents.nc", &["uo", "vo"]),
                job(GridName::Temperature, "cmems_sst.nc", &["thetao"]),
                job(GridName::Wind, "era5_wind.nc", &["u10", "v10"]),
                job(GridName::Landmask, "era5_landmask.nc", &[]),
            ],
        }
    }
}

impl PipelineConfig {
    /// Parse a YAML document. Omitted fields take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| PipelineError::Config(format!("invalid pipeline config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or use the defaults when no file is given or the
    /// file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading pipeline config");
                let text = std::fs::read_to_string(path)?;
                Self::from_yaml(&text)
            }
            Some(path) => {
                info!(path = %path.display(), "Pipeline config not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.jobs.is_empty() {
            return Err(PipelineError::Config("no jobs configured".to_string()));
        }

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if !seen.insert(job.name) {
                return Err(PipelineError::Config(format!(
                    "grid {} configured more than once",
                    job.name
                )));
            }
            if !job.name.is_static() && job.variables.is_empty() {
                return Err(PipelineError::Config(format!(
                    "grid {} needs at least one variable",
                    job.name
                )));
            }
        }

        Ok(())
    }

    /// Build the jobs with sources resolved against `raw_dir`.
    pub fn jobs(&self) -> Vec<GridJob> {
        self.jobs
            .iter()
            .map(|job| {
                let source = self.raw_dir.join(&job.source);
                let kind = if job.name.is_static() {
                    let aliases = if job.variables.is_empty() {
                        LANDMASK_ALIASES.iter().map(|a| a.to_string()).collect()
                    } else {
                        job.variables.clone()
                    };
                    JobKind::LandMask { aliases }
                } else {
                    JobKind::TimeVarying {
                        variables: job.variables.clone(),
                    }
                };
                GridJob {
                    name: job.name,
                    source,
                    kind,
                }
            })
            .collect()
    }
}
