//! Error types for grid normalization.

use grid_common::GridError;
use netcdf_parser::NetCdfError;
use thiserror::Error;

/// Errors that abort processing of a single dataset.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// None of the accepted names for an axis exist in the dataset.
    #[error("no {axis} axis found (tried {tried:?}, dataset has {present:?})")]
    MissingAxis {
        axis: String,
        tried: Vec<String>,
        present: Vec<String>,
    },

    /// A variable's horizontal axes are not in (..., latitude, longitude) order.
    #[error("variable {variable} has {axis} at dimension {position} of {dims:?}")]
    AxisOrder {
        variable: String,
        axis: String,
        position: usize,
        dims: Vec<String>,
    },

    /// An extracted array cannot be reconciled with the resolved grid.
    #[error("shape error: {0}")]
    Shape(String),

    /// The dataset holds no usable data variable.
    #[error("no data variable found (dataset has {0:?})")]
    NoDataVariable(Vec<String>),

    /// Invalid pipeline configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Dataset(#[from] NetCdfError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }
}

/// Result type for grid processing.
pub type Result<T> = std::result::Result<T, PipelineError>;
