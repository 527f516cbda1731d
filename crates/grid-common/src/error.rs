//! Error types for grid records and grid serving.

use thiserror::Error;

use crate::GridName;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Primary error type for grid storage and serving.
#[derive(Debug, Error)]
pub enum GridError {
    // === Lookup Errors ===
    #[error("Unknown grid: {0}")]
    UnknownGrid(String),

    #[error("Grid data not available: {0}")]
    NotAvailable(GridName),

    // === Record Errors ===
    #[error("Invalid grid record: {0}")]
    InvalidRecord(String),

    #[error("Variable '{variable}' has {actual} values, shape {shape:?} requires {expected}")]
    LengthMismatch {
        variable: String,
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Storage read timed out for grid {0}")]
    Timeout(GridName),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl GridError {
    /// True for errors that mean "this grid does not exist" to a client.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GridError::UnknownGrid(_) | GridError::NotAvailable(_))
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            GridError::UnknownGrid(_) | GridError::NotAvailable(_) => 404,

            GridError::Timeout(_) => 504,

            _ => 500,
        }
    }
}

impl From<std::io::Error> for GridError {
    fn from(err: std::io::Error) -> Self {
        GridError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::InvalidRecord(format!("JSON error: {}", err))
    }
}
