//! Common types shared across the ocean-grid pipeline and server.

pub mod error;
pub mod grid;
pub mod record;

pub use error::{GridError, GridResult};
pub use grid::{GridLayout, GridName, GridStatus};
pub use record::{GridRecord, GridVariable};
