//! Lazy in-memory cache of canonical grid records.
//!
//! One insert-once cell per grid name. The first fetch of a name reads the
//! record from the [`GridStore`] and memoizes either its bytes (`Loaded`)
//! or the fact that it does not exist (`Absent`); both are terminal for the
//! life of the process. Concurrent first fetches wait on the same read.
//!
//! A failed read (I/O error, timeout) leaves the cell empty so the next
//! fetch retries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use futures::future::join_all;
use grid_common::{GridError, GridName, GridResult, GridStatus};
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::grid_store::GridStore;

/// Cache state of one grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum EntryState {
    Unloaded,
    Loaded { bytes: usize },
    Absent,
}

/// Counters for the grid cache.
///
/// All fields are atomic for lock-free reads from metrics endpoints.
#[derive(Debug, Default)]
pub struct GridCacheStats {
    /// Fetches answered from an already populated cell
    pub hits: AtomicU64,
    /// Fetches that found the cell empty
    pub misses: AtomicU64,
    /// Reads issued against the grid store
    pub disk_reads: AtomicU64,
}

impl GridCacheStats {
    /// Cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Point-in-time copy of the cache counters and entry states.
#[derive(Debug, Clone, Serialize)]
pub struct GridCacheSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub disk_reads: u64,
    pub hit_rate: f64,
    pub entries: HashMap<GridName, EntryState>,
}

/// Cache of grid records keyed by grid name. No eviction.
pub struct GridCache {
    store: GridStore,
    cells: HashMap<GridName, OnceCell<Option<Bytes>>>,
    stats: GridCacheStats,
}

impl GridCache {
    /// Create a cache over `store` with every grid `Unloaded`.
    pub fn new(store: GridStore) -> Self {
        let cells = GridName::ALL
            .into_iter()
            .map(|name| (name, OnceCell::new()))
            .collect();

        Self {
            store,
            cells,
            stats: GridCacheStats::default(),
        }
    }

    pub fn store(&self) -> &GridStore {
        &self.store
    }

    /// Durable-storage presence of every grid, regardless of cache state.
    pub async fn status(&self) -> GridStatus {
        self.store.status().await
    }

    /// Fetch a grid by its client-facing name.
    pub async fn fetch_named(&self, name: &str) -> GridResult<Bytes> {
        let name: GridName = name.parse()?;
        self.fetch(name).await
    }

    /// Fetch the record bytes of `name`.
    ///
    /// Fails with [`GridError::NotAvailable`] when the record does not
    /// exist, now or at the first fetch.
    pub async fn fetch(&self, name: GridName) -> GridResult<Bytes> {
        let cell = self
            .cells
            .get(&name)
            .ok_or_else(|| GridError::UnknownGrid(name.to_string()))?;

        if let Some(entry) = cell.get() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Self::resolve(name, entry);
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let entry = cell
            .get_or_try_init(|| async {
                self.stats.disk_reads.fetch_add(1, Ordering::Relaxed);
                let loaded = self.store.read(name).await?;
                match &loaded {
                    Some(bytes) => info!(grid = %name, size = bytes.len(), "Grid loaded"),
                    None => info!(grid = %name, "Grid absent"),
                }
                Ok::<_, GridError>(loaded)
            })
            .await
            .map_err(|e| {
                warn!(grid = %name, error = %e, "Grid read failed");
                e
            })?;

        Self::resolve(name, entry)
    }

    fn resolve(name: GridName, entry: &Option<Bytes>) -> GridResult<Bytes> {
        match entry {
            Some(bytes) => Ok(bytes.clone()),
            None => Err(GridError::NotAvailable(name)),
        }
    }

    pub fn state(&self, name: GridName) -> EntryState {
        match self.cells.get(&name).and_then(|cell| cell.get()) {
            None => EntryState::Unloaded,
            Some(Some(bytes)) => EntryState::Loaded { bytes: bytes.len() },
            Some(None) => EntryState::Absent,
        }
    }

    /// Total bytes held in memory.
    pub fn memory_bytes(&self) -> usize {
        GridName::ALL
            .into_iter()
            .map(|name| match self.state(name) {
                EntryState::Loaded { bytes } => bytes,
                _ => 0,
            })
            .sum()
    }

    pub fn stats(&self) -> &GridCacheStats {
        &self.stats
    }

    pub fn snapshot(&self) -> GridCacheSnapshot {
        GridCacheSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            disk_reads: self.stats.disk_reads.load(Ordering::Relaxed),
            hit_rate: self.stats.hit_rate(),
            entries: GridName::ALL
                .into_iter()
                .map(|name| (name, self.state(name)))
                .collect(),
        }
    }

    /// Fetch every grid once. Returns the names that are available.
    pub async fn warm(&self) -> Vec<GridName> {
        let results = join_all(GridName::ALL.into_iter().map(|name| async move {
            (name, self.fetch(name).await)
        }))
        .await;

        let mut available = Vec::new();
        for (name, result) in results {
            match result {
                Ok(bytes) => {
                    debug!(grid = %name, size = bytes.len(), "Warmed grid");
                    available.push(name);
                }
                Err(GridError::NotAvailable(_)) => {}
                Err(e) => warn!(grid = %name, error = %e, "Failed to warm grid"),
            }
        }

        info!(
            available = ?available,
            total_kb = self.memory_bytes() / 1024,
            "Grid cache warmed"
        );
        available
    }
}
