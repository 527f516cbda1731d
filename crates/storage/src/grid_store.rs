//! Durable storage of canonical grid records on the local filesystem.
//!
//! Each grid lives at `<root>/<name>_grid.json`. Writes go to a hidden
//! temporary file in the same directory and are renamed into place, so a
//! reader never sees a partially written record.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use grid_common::{GridError, GridName, GridResult, GridStatus};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Default bound on a single durable read.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Directory of persisted grid records.
#[derive(Debug, Clone)]
pub struct GridStore {
    root: PathBuf,
    read_timeout: Duration,
}

impl GridStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn path_for(&self, name: GridName) -> PathBuf {
        self.root.join(name.file_name())
    }

    /// Whether a record for `name` is present.
    pub async fn exists(&self, name: GridName) -> bool {
        tokio::fs::metadata(self.path_for(name))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Size in bytes of the stored record, if present.
    pub async fn size(&self, name: GridName) -> Option<u64> {
        tokio::fs::metadata(self.path_for(name))
            .await
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len())
    }

    /// Presence of every recognized grid.
    pub async fn status(&self) -> GridStatus {
        let mut status = GridStatus::default();
        for name in GridName::ALL {
            status.set(name, self.exists(name).await);
        }
        status
    }

    /// Read a record.
    ///
    /// Returns `Ok(None)` when the record does not exist. Other I/O errors
    /// and reads exceeding the timeout are errors.
    #[instrument(skip(self), fields(grid = %name))]
    pub async fn read(&self, name: GridName) -> GridResult<Option<Bytes>> {
        let path = self.path_for(name);

        match tokio::time::timeout(self.read_timeout, tokio::fs::read(&path)).await {
            Err(_) => Err(GridError::Timeout(name)),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Grid record not present");
                Ok(None)
            }
            Ok(Err(e)) => Err(GridError::StorageError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
            Ok(Ok(data)) => {
                debug!(size = data.len(), "Read grid record");
                Ok(Some(Bytes::from(data)))
            }
        }
    }

    /// Write a record atomically and return its final path.
    #[instrument(skip(self, data), fields(grid = %name, size = data.len()))]
    pub async fn write(&self, name: GridName, data: &[u8]) -> GridResult<PathBuf> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            GridError::StorageError(format!("Failed to create {}: {}", self.root.display(), e))
        })?;

        let path = self.path_for(name);
        let tmp = self.root.join(format!(".{}.tmp", name.file_name()));

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(GridError::StorageError(format!(
                "Failed to move record into {}: {}",
                path.display(),
                e
            )));
        }

        debug!(path = %path.display(), "Wrote grid record");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = GridStore::new(dir.path());
        assert!(store.read(GridName::Wind).await.unwrap().is_none());
        assert!(!store.exists(GridName::Wind).await);
        assert_eq!(store.size(GridName::Wind).await, None);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = GridStore::new(dir.path().join("processed"));

        let path = store.write(GridName::Current, b"{\"lat\":[]}").await.unwrap();
        assert_eq!(path, dir.path().join("processed/current_grid.json"));

        let bytes = store.read(GridName::Current).await.unwrap().unwrap();
        assert_eq!(&bytes[..], b"{\"lat\":[]}");
        assert_eq!(store.size(GridName::Current).await, Some(10));

        // No temporary file is left behind.
        let entries: Vec<_> = std::fs::read_dir(store.root()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = GridStore::new(dir.path());
        store.write(GridName::Landmask, b"old").await.unwrap();
        store.write(GridName::Landmask, b"new").await.unwrap();
        assert_eq!(&store.read(GridName::Landmask).await.unwrap().unwrap()[..], b"new");
    }

    #[tokio::test]
    async fn test_status_reflects_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("wind_grid.json"), b"{}").unwrap();
        std::fs::write(dir.path().join("landmask_grid.json"), b"{}").unwrap();

        let status = GridStore::new(dir.path()).status().await;
        assert!(status.wind);
        assert!(status.landmask);
        assert!(!status.current);
        assert!(!status.temperature);
    }

    #[tokio::test]
    async fn test_unreadable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the record should be is not "absent".
        std::fs::create_dir(dir.path().join("temperature_grid.json")).unwrap();

        let store = GridStore::new(dir.path());
        let err = store.read(GridName::Temperature).await.unwrap_err();
        assert!(matches!(err, GridError::StorageError(_)));
        assert!(!store.exists(GridName::Temperature).await);
    }
}
