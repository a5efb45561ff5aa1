//! Backend Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A backend error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The extraction binary could not be found on the system.
    #[display("extraction binary not found in PATH")]
    BinaryNotFound,
    /// The extraction process could not be launched.
    #[display("failed to launch extraction process")]
    Launch,
    /// A batch extraction call failed as a whole, including unparseable
    /// output; every path in the batch is affected.
    #[display("batch extraction failed for {_0} path(s)")]
    Batch(#[error(not(source))] usize),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // A failed batch may have been a transient subprocess issue;
        // a missing binary or garbage output will not fix itself.
        matches!(self, Self::Batch(_) | Self::Launch)
    }
}
