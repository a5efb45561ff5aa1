//! Scanner Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A scanner error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The requested scan target does not exist or has the wrong kind
    /// (a file where a directory is expected, or vice versa).
    #[display("not a scannable path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Directory traversal failed partway through.
    #[display("failed to enumerate directory contents")]
    Discovery,
    /// Writing to or reading from the metadata database failed. Never
    /// counted as a per-file failure. Extraction failures are counted
    /// against the run instead of raised.
    #[display("metadata store error")]
    Store,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }
}
