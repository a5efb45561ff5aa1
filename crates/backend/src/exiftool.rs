//! Subprocess adapter for the exiftool binary.

use crate::ExtractionBackend;
use crate::error::{ErrorKind, Result};
use crate::raw::RawMetadata;
use async_trait::async_trait;
use exn::ResultExt;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::instrument;

pub(crate) const EXIFTOOL: &str = "exiftool";

/// Extraction backend that shells out to the exiftool binary.
///
/// One subprocess invocation per batch: all paths are passed as arguments
/// and exiftool emits a single JSON array with one object per input path,
/// in argument order. That amortizes process startup across the batch,
/// which is the whole point of batching in the scan pipeline.
#[derive(Debug, Clone)]
pub struct ExiftoolBackend {
    binary: PathBuf,
}

impl ExiftoolBackend {
    /// Locate the exiftool binary in `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BinaryNotFound`] when it is not installed;
    /// callers should surface this before any scan work begins.
    pub fn discover() -> Result<Self> {
        match which::which(EXIFTOOL) {
            Ok(binary) => {
                tracing::debug!(binary = %binary.display(), "discovered exiftool in PATH");
                Ok(Self { binary })
            },
            Err(_) => {
                tracing::info!("exiftool executable not found in PATH");
                exn::bail!(ErrorKind::BinaryNotFound);
            },
        }
    }

    /// Use an explicitly configured binary instead of searching `PATH`.
    pub fn at(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

#[async_trait]
impl ExtractionBackend for ExiftoolBackend {
    /// Extract raw metadata for one batch of absolute paths.
    ///
    /// `-n` keeps numeric tags numeric (sizes, coordinates) and `-q`
    /// suppresses the informational banner. Exiftool exits non-zero when
    /// any file in the batch is unreadable but still emits objects for the
    /// rest, so the exit status is ignored; only output that fails to
    /// parse as a JSON array fails the batch.
    #[instrument(skip_all, fields(batch_len = paths.len()))]
    async fn extract_batch(&self, paths: &[PathBuf]) -> Result<Vec<RawMetadata>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let mut command = Command::new(&self.binary);
        command
            .args(["-json", "-n", "-q"])
            .args(paths)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let output = command.output().await.or_raise(|| ErrorKind::Launch)?;
        let objects: Vec<serde_json::Map<String, Value>> =
            serde_json::from_slice(&output.stdout).or_raise(|| ErrorKind::Batch(paths.len()))?;
        Ok(objects.into_iter().map(RawMetadata::from).collect())
    }
}
