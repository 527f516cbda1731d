//! Batch driver: one job per logical grid, failures isolated per grid.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;

use grid_common::{GridName, GridRecord};
use storage::GridStore;
use tracing::{error, info, warn};

use crate::encode::{encode_landmask, encode_time_varying, LANDMASK_ALIASES};
use crate::error::Result;

/// How a job turns its raw dataset into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobKind {
    /// Time-varying fields with the listed variables.
    TimeVarying { variables: Vec<String> },
    /// Static land-sea mask, looked up through `aliases`.
    LandMask { aliases: Vec<String> },
}

/// One grid to produce from one raw file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridJob {
    pub name: GridName,
    pub source: PathBuf,
    pub kind: JobKind,
}

impl GridJob {
    pub fn time_varying(name: GridName, source: impl Into<PathBuf>, variables: &[&str]) -> Self {
        Self {
            name,
            source: source.into(),
            kind: JobKind::TimeVarying {
                variables: variables.iter().map(|v| v.to_string()).collect(),
            },
        }
    }

    pub fn landmask(source: impl Into<PathBuf>) -> Self {
        Self {
            name: GridName::Landmask,
            source: source.into(),
            kind: JobKind::LandMask {
                aliases: LANDMASK_ALIASES.iter().map(|a| a.to_string()).collect(),
            },
        }
    }

    /// The standard four jobs over files in `raw_dir`.
    pub fn defaults(raw_dir: &Path) -> Vec<GridJob> {
        vec![
            GridJob::time_varying(
                GridName::Current,
                raw_dir.join("cmems_currents.nc"),
                &["uo", "vo"],
            ),
            GridJob::time_varying(
                GridName::Temperature,
                raw_dir.join("cmems_sst.nc"),
                &["thetao"],
            ),
            GridJob::time_varying(GridName::Wind, raw_dir.join("era5_wind.nc"), &["u10", "v10"]),
            GridJob::landmask(raw_dir.join("era5_landmask.nc")),
        ]
    }

    /// Read the raw file and encode it.
    pub fn encode(&self) -> Result<GridRecord> {
        let dataset = netcdf_parser::open_dataset(&self.source)?;
        match &self.kind {
            JobKind::TimeVarying { variables } => encode_time_varying(&dataset, variables),
            JobKind::LandMask { aliases } => encode_landmask(&dataset, aliases),
        }
    }
}

/// What happened to one job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Produced { path: PathBuf, bytes: u64 },
    Skipped { reason: String },
    Failed { error: String },
}

/// Outcome of a whole run, in job order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSummary {
    pub outcomes: Vec<(GridName, JobOutcome)>,
}

impl PipelineSummary {
    pub fn produced(&self) -> Vec<GridName> {
        self.filter(|o| matches!(o, JobOutcome::Produced { .. }))
    }

    pub fn skipped(&self) -> Vec<GridName> {
        self.filter(|o| matches!(o, JobOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> Vec<GridName> {
        self.filter(|o| matches!(o, JobOutcome::Failed { .. }))
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|(_, o)| match o {
                JobOutcome::Produced { bytes, .. } => *bytes,
                _ => 0,
            })
            .sum()
    }

    pub fn outcome(&self, name: GridName) -> Option<&JobOutcome> {
        self.outcomes.iter().find(|(n, _)| *n == name).map(|(_, o)| o)
    }

    pub fn has_failures(&self) -> bool {
        !self.failed().is_empty()
    }

    fn filter(&self, pred: impl Fn(&JobOutcome) -> bool) -> Vec<GridName> {
        self.outcomes
            .iter()
            .filter(|(_, o)| pred(o))
            .map(|(n, _)| *n)
            .collect()
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, outcome) in &self.outcomes {
            match outcome {
                JobOutcome::Produced { path, bytes } => writeln!(
                    f,
                    "  {:<12} {} ({} KB)",
                    name.as_str(),
                    path.display(),
                    bytes / 1024
                )?,
                JobOutcome::Skipped { reason } => {
                    writeln!(f, "  {:<12} skipped: {}", name.as_str(), reason)?
                }
                JobOutcome::Failed { error } => {
                    writeln!(f, "  {:<12} FAILED: {}", name.as_str(), error)?
                }
            }
        }
        write!(f, "  total: {} KB", self.total_bytes() / 1024)
    }
}

/// Run every job in order, persisting records through `store`.
///
/// A job whose raw file is missing is skipped; a job that fails is logged
/// and the remaining jobs still run.
pub async fn run_all(jobs: Vec<GridJob>, store: &GridStore) -> PipelineSummary {
    let total = jobs.len();
    let mut summary = PipelineSummary::default();

    for (index, job) in jobs.into_iter().enumerate() {
        let name = job.name;
        let step = index + 1;

        if !job.source.exists() {
            info!(
                grid = %name,
                step, total,
                source = %job.source.display(),
                "Raw file not found, skipping"
            );
            summary.outcomes.push((
                name,
                JobOutcome::Skipped {
                    reason: format!("{} not found", job.source.display()),
                },
            ));
            continue;
        }

        info!(grid = %name, step, total, source = %job.source.display(), "Processing grid");
        let outcome = run_job(job, store).await;
        if let JobOutcome::Failed { error } = &outcome {
            error!(grid = %name, error = %error, "Grid processing failed");
        }
        summary.outcomes.push((name, outcome));
    }

    if summary.has_failures() {
        warn!(failed = ?summary.failed(), "Pipeline finished with failures");
    }
    info!(
        produced = ?summary.produced(),
        skipped = ?summary.skipped(),
        total_kb = summary.total_bytes() / 1024,
        "Pipeline finished"
    );
    summary
}

async fn run_job(job: GridJob, store: &GridStore) -> JobOutcome {
    let start = Instant::now();
    let name = job.name;

    // Decoding is CPU-bound and may shell out to ncdump.
    let encoded = tokio::task::spawn_blocking(move || {
        job.encode()
            .and_then(|record| record.to_json_bytes().map_err(Into::into))
    })
    .await;

    let bytes = match encoded {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => return JobOutcome::Failed { error: e.to_string() },
        Err(e) => return JobOutcome::Failed { error: format!("worker panicked: {}", e) },
    };

    match store.write(name, &bytes).await {
        Ok(path) => {
            info!(
                grid = %name,
                path = %path.display(),
                size_kb = bytes.len() / 1024,
                duration_ms = start.elapsed().as_millis() as u64,
                "Grid written"
            );
            JobOutcome::Produced {
                path,
                bytes: bytes.len() as u64,
            }
        }
        Err(e) => JobOutcome::Failed { error: e.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_jobs() {
        let jobs = GridJob::defaults(Path::new("data/raw"));
        let names: Vec<GridName> = jobs.iter().map(|j| j.name).collect();
        assert_eq!(
            names,
            vec![GridName::Current, GridName::Temperature, GridName::Wind, GridName::Landmask]
        );
        assert_eq!(jobs[0].source, Path::new("data/raw/cmems_currents.nc"));
        assert_eq!(
            jobs[2].kind,
            JobKind::TimeVarying {
                variables: vec!["u10".into(), "v10".into()]
            }
        );
        assert!(matches!(&jobs[3].kind, JobKind::LandMask { aliases } if aliases[0] == "lsm"));
    }

    #[test]
    fn test_summary_partitions() {
        let summary = PipelineSummary {
            outcomes: vec![
                (
                    GridName::Current,
                    JobOutcome::Produced {
                        path: PathBuf::from("current_grid.json"),
                        bytes: 4096,
                    },
                ),
                (
                    GridName::Wind,
                    JobOutcome::Skipped {
                        reason: "missing".into(),
                    },
                ),
                (
                    GridName::Landmask,
                    JobOutcome::Failed {
                        error: "boom".into(),
                    },
                ),
            ],
        };

        assert_eq!(summary.produced(), vec![GridName::Current]);
        assert_eq!(summary.skipped(), vec![GridName::Wind]);
        assert_eq!(summary.failed(), vec![GridName::Landmask]);
        assert_eq!(summary.total_bytes(), 4096);
        assert!(summary.to_string().contains("total: 4 KB"));
    }
}
