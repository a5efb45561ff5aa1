//! Scripted in-memory backend for testing scan pipelines.

use crate::ExtractionBackend;
use crate::error::{ErrorKind, Result};
use crate::raw::RawMetadata;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

enum Scripted {
    /// Fail the whole batch, exercising the per-batch failure path.
    Fail,
    /// Return exactly these records, regardless of the requested paths.
    Records(Vec<RawMetadata>),
}

/// Extraction backend double with scripted responses.
///
/// Each `extract_batch` call consumes the next scripted response in FIFO
/// order. Once the script is exhausted (or if none was given), the mock
/// synthesizes one minimal record per requested path, so the happy path
/// needs no scripting at all.
#[derive(Default)]
pub struct MockBackend {
    script: Mutex<VecDeque<Scripted>>,
    calls: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next call to fail as a whole batch.
    pub fn then_fail(self) -> Self {
        self.script.lock().expect("mock script lock").push_back(Scripted::Fail);
        self
    }

    /// Script the next call to return these records verbatim.
    pub fn then_records(self, records: Vec<RawMetadata>) -> Self {
        self.script.lock().expect("mock script lock").push_back(Scripted::Records(records));
        self
    }

    /// Number of batch calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn synthesize(paths: &[PathBuf]) -> Vec<RawMetadata> {
        paths
            .iter()
            .map(|path| {
                let mut fields = BTreeMap::new();
                fields.insert("SourceFile".to_string(), Value::String(path.display().to_string()));
                RawMetadata::new(fields)
            })
            .collect()
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    async fn extract_batch(&self, paths: &[PathBuf]) -> Result<Vec<RawMetadata>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().expect("mock script lock").pop_front();
        match next {
            Some(Scripted::Fail) => exn::bail!(ErrorKind::Batch(paths.len())),
            Some(Scripted::Records(records)) => Ok(records),
            None => Ok(Self::synthesize(paths)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_synthesized_records_carry_source_file() {
        let backend = MockBackend::new();
        let records = backend.extract_batch(&[PathBuf::from("/t/a.jpg")]).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_file(), Some("/t/a.jpg"));
    }

    #[tokio::test]
    async fn test_script_is_consumed_in_order() {
        let backend = MockBackend::new().then_fail();
        let paths = [PathBuf::from("/t/a.jpg")];
        assert!(backend.extract_batch(&paths).await.is_err());
        assert!(backend.extract_batch(&paths).await.is_ok());
        assert_eq!(backend.calls(), 2);
    }
}
