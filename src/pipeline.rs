//! Lookup pipeline
//!
//! Composes the fetcher, inspector and digest tool into the two public
//! lookup operations. Each invocation owns a scoped temporary workspace
//! that is removed on every exit path, success or failure.

use crate::config::schema::Config;
use crate::digest::DigestTool;
use crate::error::{SrpmError, SrpmResult};
use crate::fetch::Fetcher;
use crate::inspect::{Inspector, SrpmMetadata};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::info;

/// One fetched artifact's identity
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpstreamSource {
    pub url: String,
    pub sha256: String,
}

/// Parsed package identity plus the closure of its declared sources
///
/// `sources` preserves spec file declaration order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CachedSrpm {
    pub name: String,
    pub epoch: Option<String>,
    pub version: String,
    pub release: String,
    pub sources: Vec<UpstreamSource>,
}

/// The download-extract-hash pipeline behind both lookup operations
#[derive(Debug, Clone)]
pub struct Pipeline {
    fetcher: Fetcher,
    inspector: Inspector,
    hasher: DigestTool,
    work_root: Option<PathBuf>,
}

impl Pipeline {
    /// Build a pipeline from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            fetcher: Fetcher::new(),
            inspector: Inspector::new(config.tools.clone()),
            hasher: DigestTool::new(&config.tools.sha256sum),
            work_root: config.general.work_dir.clone(),
        }
    }

    /// Report hash details for a given URL, retrieving and hashing as needed
    pub async fn lookup_source(&self, url: &str) -> SrpmResult<UpstreamSource> {
        let work = self.workspace()?;
        let path = self.fetcher.fetch(url, work.path()).await?;
        let sha256 = self.hasher.digest(&path).await?;
        info!("Resolved source {} -> {}", url, sha256);
        Ok(UpstreamSource {
            url: url.to_string(),
            sha256,
        })
    }

    /// Report SRPM details for a given URL, retrieving and parsing as needed
    ///
    /// A failed fetch of the requested SRPM propagates as `RemoteLookup`;
    /// every failure after that point is the package's fault from the
    /// caller's perspective and is reported as `InvalidSrpm` carrying the
    /// original request URL, even when the proximate cause was a broken
    /// source reference.
    pub async fn lookup_srpm(&self, url: &str) -> SrpmResult<CachedSrpm> {
        let work = self.workspace()?;
        let srpm_path = self.fetcher.fetch(url, work.path()).await?;

        let srpm = self
            .resolve_contents(&srpm_path, work.path())
            .await
            .map_err(|e| SrpmError::invalid_srpm(url, e))?;

        info!(
            "Resolved SRPM {} -> {}-{}-{} with {} sources",
            url,
            srpm.name,
            srpm.version,
            srpm.release,
            srpm.sources.len()
        );
        Ok(srpm)
    }

    /// Inspect a fetched SRPM and resolve every declared source
    ///
    /// Sources already materialized by payload extraction are digested in
    /// place; the rest are fetched into the same workspace first.
    async fn resolve_contents(&self, srpm_path: &Path, work: &Path) -> SrpmResult<CachedSrpm> {
        let (metadata, declared) = self.inspector.inspect(srpm_path, work).await?;

        let mut sources = Vec::with_capacity(declared.len());
        for source in declared {
            let local = if source.local_path.exists() {
                source.local_path
            } else {
                self.fetcher.fetch(&source.url, work).await?
            };
            let sha256 = self.hasher.digest(&local).await?;
            sources.push(UpstreamSource {
                url: source.url,
                sha256,
            });
        }

        assemble(metadata, sources)
    }

    fn workspace(&self) -> SrpmResult<TempDir> {
        let created = match &self.work_root {
            Some(root) => tempfile::tempdir_in(root),
            None => tempfile::tempdir(),
        };
        created.map_err(|e| SrpmError::io("creating lookup workspace", e))
    }
}

/// Assemble the result record, requiring the identity fields to be present
fn assemble(metadata: SrpmMetadata, sources: Vec<UpstreamSource>) -> SrpmResult<CachedSrpm> {
    let SrpmMetadata {
        epoch,
        name,
        version,
        release,
    } = metadata;

    Ok(CachedSrpm {
        name: name.ok_or(SrpmError::MissingHeaderField { field: "Name" })?,
        epoch,
        version: version.ok_or(SrpmError::MissingHeaderField { field: "Version" })?,
        release: release.ok_or(SrpmError::MissingHeaderField { field: "Release" })?,
        sources,
    })
}
