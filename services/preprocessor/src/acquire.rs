//! Acquisition of raw provider files.
//!
//! Each request is fetched independently into the raw directory. A failure
//! is logged with guidance for the operator and never stops the others.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use grid_common::GridName;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, instrument};

use crate::config::DownloadRequest;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("credential variable {0} is not set")]
    MissingCredentials(String),

    #[error("provider rejected credentials (HTTP {0})")]
    Unauthorized(StatusCode),

    #[error("provider returned HTTP {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    /// What the operator should do about this failure.
    pub fn guidance(&self) -> &'static str {
        match self {
            ProviderError::MissingCredentials(_) => {
                "export the token variable named by token_env before running download"
            }
            ProviderError::Unauthorized(_) => {
                "check that the provider account is active and the token has not expired"
            }
            ProviderError::Status(status) if status.is_server_error() => {
                "the provider is unavailable; retry later"
            }
            ProviderError::Status(_) => "check the configured url",
            ProviderError::Request(_) => "check network access to the provider",
            ProviderError::Io(_) => "check that the raw directory is writable",
        }
    }
}

/// A source of raw files.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetch `request` into `dest`.
    async fn fetch(&self, request: &DownloadRequest, dest: &Path) -> Result<(), ProviderError>;
}

/// Plain HTTP(S) downloads.
pub struct HttpProvider {
    client: Client,
}

impl HttpProvider {
    pub fn new(timeout: Duration) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    fn token(request: &DownloadRequest) -> Result<Option<String>, ProviderError> {
        match &request.token_env {
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| ProviderError::MissingCredentials(var.clone())),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl DataProvider for HttpProvider {
    #[instrument(skip(self, request), fields(grid = %request.grid, url = %request.url))]
    async fn fetch(&self, request: &DownloadRequest, dest: &Path) -> Result<(), ProviderError> {
        let mut builder = self.client.get(&request.url);
        if let Some(token) = Self::token(request)? {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        match response.status() {
            status if status.is_success() => {}
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                return Err(ProviderError::Unauthorized(status))
            }
            status => return Err(ProviderError::Status(status)),
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }
        let partial = partial_path(dest);
        let mut file = fs::File::create(&partial).await?;
        let mut written = 0u64;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    drop(file);
                    fs::remove_file(&partial).await.ok();
                    return Err(e.into());
                }
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        fs::rename(&partial, dest).await?;
        info!(path = %dest.display(), bytes = written, "Download completed");
        Ok(())
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Result of one acquisition.
#[derive(Debug)]
pub struct Acquired {
    pub grid: GridName,
    pub result: Result<PathBuf, ProviderError>,
}

/// Fetch every request into `raw_dir`, each independently.
pub async fn acquire_all(
    provider: &dyn DataProvider,
    requests: &[DownloadRequest],
    raw_dir: &Path,
) -> Vec<Acquired> {
    let mut results = Vec::with_capacity(requests.len());

    for request in requests {
        let dest = raw_dir.join(&request.file_name);
        let result = provider.fetch(request, &dest).await.map(|()| dest);

        if let Err(e) = &result {
            error!(
                grid = %request.grid,
                url = %request.url,
                error = %e,
                guidance = e.guidance(),
                "Download failed"
            );
        }
        results.push(Acquired {
            grid: request.grid,
            result,
        });
    }

    results
}
