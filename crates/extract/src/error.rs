//! Normalization Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A normalization error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for normalization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The raw record carries no source path and cannot be attributed to
    /// a file. The scanner counts this against the run, it is never fatal.
    #[display("raw metadata record has no source path")]
    MissingSourceFile,
    /// A file could not be opened or read for hashing.
    #[display("unreadable file: {}", _0.display())]
    Unreadable(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A record without a source path will never grow one; an
        // unreadable file is usually a permissions problem.
        false
    }
}
