//! Content digest computation
//!
//! Digests go through the external hashing tool rather than an in-process
//! implementation; the service treats hashing as one more toolchain
//! capability. Output that cannot be parsed back to the input path is a
//! toolchain malfunction, not a bad input, and is never retried.

use crate::error::{SrpmError, SrpmResult};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Computes content digests by invoking the configured hashing tool
#[derive(Debug, Clone)]
pub struct DigestTool {
    command: String,
}

impl DigestTool {
    /// Create a digest tool around the given command (e.g. `sha256sum`)
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Compute the hex digest of the file at `path`
    pub async fn digest(&self, path: &Path) -> SrpmResult<String> {
        let rendered = format!("{} {}", self.command, path.display());

        let output = Command::new(&self.command)
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| SrpmError::command_failed(&rendered, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SrpmError::command_exec(&rendered, stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let digest = parse_digest_output(&stdout, path)?;
        debug!("{} -> sha256: {}", path.display(), digest);
        Ok(digest)
    }
}

/// Parse hashing tool output of the form `<digest> <path>` and verify the
/// echoed path matches the input
fn parse_digest_output(output: &str, path: &Path) -> SrpmResult<String> {
    let unparseable = || SrpmError::DigestUnparseable {
        path: path.to_path_buf(),
        output: output.to_string(),
    };

    let line = output.lines().next().ok_or_else(unparseable)?;
    let (digest, echoed_path) = line.split_once(' ').ok_or_else(unparseable)?;

    if digest.is_empty() || echoed_path.trim() != path.to_string_lossy() {
        return Err(unparseable());
    }

    Ok(digest.to_string())
}
