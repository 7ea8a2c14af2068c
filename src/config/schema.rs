//! Configuration schema for srpminfo
//!
//! Configuration is stored at `~/.config/srpminfo/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// HTTP server settings
    pub server: ServerConfig,

    /// External tool commands
    pub tools: ToolsConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Scratch root for per-lookup workspaces (system temp dir when unset)
    pub work_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            work_dir: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Commands for the external tools the pipeline drives
///
/// Plain names resolve through PATH; absolute paths work too, which is how
/// the test suite substitutes stub executables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// RPM header query tool
    pub rpm: String,

    /// SRPM payload converter (feeds cpio)
    pub rpm2cpio: String,

    /// Archive unpacker
    pub cpio: String,

    /// Specfile source-directive query tool
    pub spectool: String,

    /// Content hashing tool
    pub sha256sum: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            rpm: "rpm".to_string(),
            rpm2cpio: "rpm2cpio".to_string(),
            cpio: "cpio".to_string(),
            spectool: "spectool".to_string(),
            sha256sum: "sha256sum".to_string(),
        }
    }
}
