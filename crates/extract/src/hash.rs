//! Explicit content hashing for duplicate detection.
//!
//! Normalization never hashes anything; reading every file back would turn
//! a metadata scan into a full-disk read. Callers that want duplicate
//! detection invoke this on the records they care about.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::Path;
use tokio::io::AsyncReadExt;
use tracing::instrument;

const CHUNK_SIZE: usize = 8192;

/// Selectable digest for [`hash_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    /// Fast cryptographic hash; the right default for duplicate detection.
    #[default]
    Blake3,
    /// Cheap checksum when collision resistance does not matter.
    Crc32,
}

enum Digest {
    Blake3(blake3::Hasher),
    Crc32(crc32fast::Hasher),
}

impl Digest {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(blake3::Hasher::new()),
            HashAlgorithm::Crc32 => Self::Crc32(crc32fast::Hasher::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Blake3(hasher) => {
                hasher.update(chunk);
            },
            Self::Crc32(hasher) => hasher.update(chunk),
        }
    }

    fn finalize(self) -> String {
        match self {
            Self::Blake3(hasher) => hasher.finalize().to_string(),
            Self::Crc32(hasher) => format!("{:08x}", hasher.finalize()),
        }
    }
}

/// Stream a file through the selected digest in fixed-size chunks.
///
/// # Errors
///
/// Returns [`ErrorKind::Unreadable`] if the file cannot be opened or read.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub async fn hash_file(path: impl AsRef<Path>, algorithm: HashAlgorithm) -> Result<String> {
    let path = path.as_ref();
    let mut file = tokio::fs::File::open(path)
        .await
        .or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
    let mut digest = Digest::new(algorithm);
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut chunk).await.or_raise(|| ErrorKind::Unreadable(path.to_path_buf()))?;
        if read == 0 {
            break;
        }
        digest.update(&chunk[..read]);
    }
    Ok(digest.finalize())
}
