//! Error types for srpminfo
//!
//! All modules use `SrpmResult<T>` as their return type. The HTTP boundary
//! never matches individual variants; it classifies through
//! [`LookupErrorKind`] only.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for srpminfo operations
pub type SrpmResult<T> = Result<T, SrpmError>;

/// Coarse error classification consumed by the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupErrorKind {
    /// The remote URL could not be fetched (404-class)
    RemoteLookupFailure,
    /// A fetched SRPM could not be processed (400-class)
    InvalidPackage,
    /// Toolchain malfunction or broken invariant (500-class)
    InternalFailure,
}

/// All errors that can occur in srpminfo
#[derive(Error, Debug)]
pub enum SrpmError {
    // Domain errors
    #[error("failed to look up remote URL {url}: {detail}")]
    RemoteLookup {
        url: String,
        /// HTTP status, if the failure happened above the transport layer
        status: Option<u16>,
        reason: Option<String>,
        detail: String,
    },

    #[error("unable to process SRPM from {url}: {cause}")]
    InvalidSrpm { url: String, cause: String },

    // External tool errors
    #[error("command failed to start: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command exited unsuccessfully: {command}, stderr: {stderr}")]
    CommandExecution { command: String, stderr: String },

    #[error("cannot parse digest of {path} from hashing tool output: {output:?}")]
    DigestUnparseable { path: PathBuf, output: String },

    // Inspection errors
    #[error("expected exactly 1 specfile in {dir}, found {found}")]
    SpecfileCount { dir: PathBuf, found: usize },

    #[error("malformed source directive line: {line:?}")]
    MalformedSourceLine { line: String },

    #[error("package header is missing the {field} field")]
    MissingHeaderField { field: &'static str },

    // Configuration errors
    #[error("invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    // Server errors
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated unexpectedly")]
    Serve {
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // General errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl SrpmError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a command execution error
    pub fn command_exec(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::CommandExecution {
            command: command.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a transport-level remote lookup error (no HTTP status)
    pub fn transport(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::RemoteLookup {
            url: url.into(),
            status: None,
            reason: None,
            detail: detail.into(),
        }
    }

    /// Wrap any failure of an SRPM lookup with the original request URL
    pub fn invalid_srpm(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::InvalidSrpm {
            url: url.into(),
            cause: cause.to_string(),
        }
    }

    /// Classify this error for the HTTP boundary
    pub fn kind(&self) -> LookupErrorKind {
        match self {
            Self::RemoteLookup { .. } => LookupErrorKind::RemoteLookupFailure,
            Self::InvalidSrpm { .. } => LookupErrorKind::InvalidPackage,
            Self::CommandFailed { .. }
            | Self::CommandExecution { .. }
            | Self::DigestUnparseable { .. }
            | Self::SpecfileCount { .. }
            | Self::MalformedSourceLine { .. }
            | Self::MissingHeaderField { .. }
            | Self::ConfigInvalid { .. }
            | Self::Bind { .. }
            | Self::Serve { .. }
            | Self::Io { .. }
            | Self::Internal(_) => LookupErrorKind::InternalFailure,
        }
    }

    /// The remote URL this error concerns, when it carries one
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Self::RemoteLookup { url, .. } | Self::InvalidSrpm { url, .. } => Some(url),
            _ => None,
        }
    }
}
