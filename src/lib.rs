//! srpminfo - Caching SRPM Lookup Service
//!
//! Fetches remote source artifacts and SRPMs, digests them and extracts
//! package metadata, memoizing results per URL with single-flight
//! semantics.

pub mod cache;
pub mod config;
pub mod digest;
pub mod error;
pub mod fetch;
pub mod inspect;
pub mod pipeline;
pub mod server;

pub use error::{LookupErrorKind, SrpmError, SrpmResult};
pub use pipeline::{CachedSrpm, UpstreamSource};
