//! Grid normalization pipeline.
//!
//! Converts raw, inconsistently oriented NetCDF datasets into canonical
//! grid records: ascending latitude and longitude, no vertical axis, no
//! missing values, fixed precision, row-major flat arrays.
//!
//! # Architecture
//!
//! ```text
//! raw dataset (netcdf-parser)
//!      │
//!      ▼
//! coords::resolve_coords      latitude / longitude / time by alias
//!      │
//!      ▼
//! extract::extract_variable   drop depth, flip, fill NaN
//!      │
//!      ▼
//! encode::encode_*            round, flatten, assemble GridRecord
//!      │
//!      ▼
//! pipeline::run_all           one job per grid, atomic write to GridStore
//! ```

pub mod array;
pub mod config;
pub mod coords;
pub mod encode;
pub mod error;
pub mod extract;
pub mod inspect;
pub mod pipeline;

pub use array::GridArray;
pub use config::{JobConfig, PipelineConfig};
pub use coords::{resolve_coords, AxisKind, ResolvedAxis, ResolvedCoords, TimeAxis};
pub use encode::{encode_landmask, encode_time_varying, round_to};
pub use error::{PipelineError, Result};
pub use extract::{extract_variable, FieldKind};
pub use inspect::{inspect, DatasetReport};
pub use pipeline::{run_all, GridJob, JobKind, JobOutcome, PipelineSummary};
