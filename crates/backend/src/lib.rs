//! Extraction backend boundary for metafinder.
//!
//! The backend is an external program (exiftool) that, given a batch of
//! file paths, returns one raw key-value metadata map per path. This crate
//! owns that contract: the [`ExtractionBackend`] trait, the subprocess
//! implementation, the typed [`RawMetadata`] adapter over the raw maps,
//! and the capability [`probe`].
//!
//! The failure mode is uniform per batch: either the whole batch produces
//! records or the whole batch fails. Per-file failure accounting on top of
//! that is the scanner's job.

pub mod error;
mod exiftool;
#[cfg(any(test, feature = "mock"))]
mod mock;
pub mod probe;
mod raw;

use async_trait::async_trait;
use std::path::PathBuf;

pub use crate::exiftool::ExiftoolBackend;
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockBackend;
pub use crate::raw::RawMetadata;

/// A batched metadata extraction backend.
///
/// The response is ordered: one [`RawMetadata`] per input path, in input
/// order. Implementations fail the batch as a whole; they never report
/// partial results as errors.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    async fn extract_batch(&self, paths: &[PathBuf]) -> error::Result<Vec<RawMetadata>>;
}
