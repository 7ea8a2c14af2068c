//! Artifact fetching
//!
//! Streams remote artifacts into a caller-owned workspace directory. Any
//! transport failure or non-200 status becomes a `RemoteLookup` error; there
//! are no retries, so callers may not assume idempotent retry safety.

use crate::error::{SrpmError, SrpmResult};
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// How much of an error response body is kept for diagnostics
const DETAIL_LIMIT: usize = 512;

/// Downloads remote artifacts over HTTP
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with a fresh HTTP client
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Download `url` into `dest`, naming the file after the URL's final
    /// path segment
    ///
    /// Returns once the response stream is exhausted and the file is fully
    /// written.
    pub async fn fetch(&self, url: &str, dest: &Path) -> SrpmResult<PathBuf> {
        debug!("Fetching artifact from: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SrpmError::transport(url, e.to_string()))?;

        if response.status() != StatusCode::OK {
            let effective_url = response.url().to_string();
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SrpmError::RemoteLookup {
                url: effective_url,
                status: Some(status.as_u16()),
                reason: status.canonical_reason().map(str::to_string),
                detail: truncate_detail(&body),
            });
        }

        let local_path = dest.join(file_name_from_url(url));
        debug!("Downloading artifact to {}", local_path.display());

        let mut file = File::create(&local_path)
            .await
            .map_err(|e| SrpmError::io(format!("creating {}", local_path.display()), e))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| SrpmError::transport(url, e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| SrpmError::io(format!("writing {}", local_path.display()), e))?;
        }
        file.flush()
            .await
            .map_err(|e| SrpmError::io(format!("flushing {}", local_path.display()), e))?;

        Ok(local_path)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// The final path segment of a URL, used as the local file name
pub fn file_name_from_url(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

fn truncate_detail(body: &str) -> String {
    let mut detail: String = body.chars().take(DETAIL_LIMIT).collect();
    if detail.len() < body.len() {
        detail.push_str("...");
    }
    detail
}
