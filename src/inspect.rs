//! SRPM inspection
//!
//! Drives the external packaging tools: `rpm` for header metadata,
//! `rpm2cpio | cpio` for payload extraction, `spectool` for the declared
//! source URLs. The inspector reports raw tool failures; domain wrapping
//! into `InvalidSrpm` happens one level up in the pipeline, where the
//! original request URL is known.

use crate::config::schema::ToolsConfig;
use crate::error::{SrpmError, SrpmResult};
use crate::fetch::file_name_from_url;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Header fields of interest from the package metadata
///
/// Absent fields stay unset; the parse step itself never fails on a
/// missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SrpmMetadata {
    pub epoch: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
}

/// One source directive from the spec file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSource {
    /// Upstream URL as declared
    pub url: String,
    /// Where the extracted payload would have materialized this source
    pub local_path: PathBuf,
}

/// Extracts metadata and declared sources from a local SRPM file
#[derive(Debug, Clone)]
pub struct Inspector {
    tools: ToolsConfig,
}

impl Inspector {
    /// Create an inspector using the given tool commands
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }

    /// Inspect `srpm`, extracting its payload into `work`
    ///
    /// Returns the parsed header fields plus the declared sources in spec
    /// file declaration order.
    pub async fn inspect(
        &self,
        srpm: &Path,
        work: &Path,
    ) -> SrpmResult<(SrpmMetadata, Vec<DeclaredSource>)> {
        let metadata = self.read_metadata(srpm).await?;
        let extracted = self.extract_payload(srpm, work).await?;
        let spec = find_specfile(work, &extracted)?;
        let sources = self.query_sources(&spec, work).await?;
        Ok((metadata, sources))
    }

    /// Read header metadata via the package query tool
    async fn read_metadata(&self, srpm: &Path) -> SrpmResult<SrpmMetadata> {
        let rendered = format!("{} --query --package --info {}", self.tools.rpm, srpm.display());
        debug!("Reading SRPM metadata: {}", rendered);

        let output = Command::new(&self.tools.rpm)
            .args(["--query", "--package", "--info"])
            .arg(srpm)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SrpmError::command_failed(&rendered, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SrpmError::command_exec(&rendered, stderr));
        }

        Ok(parse_package_info(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Extract the SRPM payload into `work` and return the newly created
    /// paths
    ///
    /// New files are found by diffing the directory listing, which
    /// tolerates a non-empty `work` even though callers always pass a fresh
    /// workspace.
    async fn extract_payload(&self, srpm: &Path, work: &Path) -> SrpmResult<Vec<PathBuf>> {
        let before = list_dir(work)?;

        let script = format!(
            "{} {} | {} -idm",
            shell_quote(&self.tools.rpm2cpio),
            shell_quote(&srpm.to_string_lossy()),
            shell_quote(&self.tools.cpio),
        );
        debug!("Extracting SRPM contents: {}", script);

        let output = Command::new("sh")
            .args(["-c", &script])
            .current_dir(work)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SrpmError::command_failed(&script, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SrpmError::command_exec(&script, stderr));
        }

        let after = list_dir(work)?;
        let new_paths: Vec<PathBuf> = after.difference(&before).cloned().collect();
        debug!("Extracted files: {:?}", new_paths);
        Ok(new_paths)
    }

    /// Enumerate the declared sources of `spec` via the spec query tool
    async fn query_sources(&self, spec: &Path, work: &Path) -> SrpmResult<Vec<DeclaredSource>> {
        let rendered = format!("{} -S {}", self.tools.spectool, spec.display());
        debug!("Querying specfile for sources: {}", rendered);

        let output = Command::new(&self.tools.spectool)
            .arg("-S")
            .arg(spec)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SrpmError::command_failed(&rendered, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SrpmError::command_exec(&rendered, stderr));
        }

        parse_source_listing(&String::from_utf8_lossy(&output.stdout), work)
    }
}

/// Parse `rpm --query --package --info` output into header fields
///
/// Keys are matched case-insensitively; only epoch, name, version and
/// release are kept.
fn parse_package_info(output: &str) -> SrpmMetadata {
    let mut metadata = SrpmMetadata::default();
    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "epoch" => metadata.epoch = Some(value.to_string()),
            "name" => metadata.name = Some(value.to_string()),
            "version" => metadata.version = Some(value.to_string()),
            "release" => metadata.release = Some(value.to_string()),
            _ => {}
        }
    }
    metadata
}

/// Parse spec query output: one `name url` pair per line, declaration order
/// preserved
fn parse_source_listing(output: &str, work: &Path) -> SrpmResult<Vec<DeclaredSource>> {
    let mut sources = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let Some((_, url)) = line.split_once(' ') else {
            return Err(SrpmError::MalformedSourceLine {
                line: line.to_string(),
            });
        };
        let url = url.trim().to_string();
        let local_path = work.join(file_name_from_url(&url));
        sources.push(DeclaredSource { url, local_path });
    }
    Ok(sources)
}

/// Exactly one `*.spec` file must exist among the extracted paths
fn find_specfile(work: &Path, extracted: &[PathBuf]) -> SrpmResult<PathBuf> {
    let specs: Vec<&PathBuf> = extracted
        .iter()
        .filter(|p| p.extension().is_some_and(|ext| ext == "spec"))
        .collect();

    match specs.as_slice() {
        [spec] => Ok((*spec).clone()),
        _ => Err(SrpmError::SpecfileCount {
            dir: work.to_path_buf(),
            found: specs.len(),
        }),
    }
}

fn list_dir(dir: &Path) -> SrpmResult<BTreeSet<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| SrpmError::io(format!("listing {}", dir.display()), e))?;

    let mut paths = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| SrpmError::io(format!("listing {}", dir.display()), e))?;
        paths.insert(entry.path());
    }
    Ok(paths)
}

/// Single-quote `s` for use inside an `sh -c` script
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
