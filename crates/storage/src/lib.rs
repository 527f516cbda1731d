//! Storage for canonical grid records.
//!
//! - [`GridStore`]: durable records on the local filesystem
//! - [`GridCache`]: lazy, insert-once in-memory cache used by the server

pub mod grid_cache;
pub mod grid_store;

pub use grid_cache::{EntryState, GridCache, GridCacheSnapshot, GridCacheStats};
pub use grid_store::{GridStore, DEFAULT_READ_TIMEOUT};
