use crate::discover::discover;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use metafinder_backend::{ExtractionBackend, RawMetadata};
use metafinder_extract::{FileRecord, normalize};
use metafinder_store::Store;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tracing::{debug, instrument, warn};

/// Files sent to the extraction backend per subprocess invocation.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Observer invoked after each file with `(current, total, file_name)`.
///
/// Purely a notification: it cannot cancel the run or alter its outcome.
pub type Progress<'a> = &'a (dyn Fn(usize, usize, &str) + Send + Sync);

/// Outcome tallies for one scan run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Files normalized and written to the store.
    pub scanned: usize,
    /// Files that failed extraction or normalization.
    pub failed: usize,
    /// Files discovered; always `scanned + failed` at the end of a run.
    pub total: usize,
}

impl RunStats {
    /// Percentage of discovered files that made it into the store.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.scanned as f64 / self.total as f64 * 100.0
    }
}

/// The extraction pipeline: discovers files, runs them through the
/// backend in fixed-size batches, normalizes each raw response and
/// upserts the result into the store.
///
/// A failed batch or a file that cannot be normalized is counted in
/// [`RunStats::failed`] and the run continues; store errors abort the run.
pub struct Scanner<B> {
    backend: B,
    store: Store,
    batch_size: usize,
}

impl<B: ExtractionBackend> Scanner<B> {
    pub fn new(backend: B, store: Store) -> Self {
        Self { backend, store, batch_size: DEFAULT_BATCH_SIZE }
    }

    /// Override the batch size. Clamped to at least one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Scan a directory and index every discovered file.
    ///
    /// Immediate children only unless `recursive`. The extension filter,
    /// when given, is matched case-insensitively. An empty directory is a
    /// successful run with zero totals and no backend invocation.
    #[instrument(skip_all, fields(folder = %folder.as_ref().display()))]
    pub async fn scan(
        &self,
        folder: impl AsRef<Path>,
        recursive: bool,
        extension_filter: Option<&[String]>,
        progress: Option<Progress<'_>>,
    ) -> Result<RunStats> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(folder.to_path_buf()));
        }
        let paths = discover(folder, recursive, extension_filter).await?;
        debug!(count = paths.len(), "discovered files");
        self.scan_paths(&paths, progress).await
    }

    /// Extract metadata for a single file without touching the store.
    ///
    /// A failed backend call, an empty backend response, or a record that
    /// cannot be normalized is logged and reported as `Ok(None)`; the only
    /// error is a path that is not an existing regular file.
    pub async fn scan_single_file(&self, path: impl AsRef<Path>) -> Result<Option<FileRecord>> {
        let path = path.as_ref();
        if !path.is_file() {
            exn::bail!(ErrorKind::InvalidPath(path.to_path_buf()));
        }
        let batch = [path.to_path_buf()];
        let raw = match self.backend.extract_batch(&batch).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "extraction failed");
                return Ok(None);
            },
        };
        let Some(raw) = raw.into_iter().next() else {
            warn!(path = %path.display(), "backend returned no metadata");
            return Ok(None);
        };
        match normalize(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "normalization failed");
                Ok(None)
            },
        }
    }

    /// Re-index only the files under `folder` that changed since they were
    /// last stored.
    ///
    /// A file counts as changed when the store has no record for its path
    /// or its filesystem modification time is newer than the stored one.
    /// Discovery is always recursive here.
    #[instrument(skip_all, fields(folder = %folder.as_ref().display()))]
    pub async fn rescan_changed(&self, folder: impl AsRef<Path>) -> Result<RunStats> {
        let folder = folder.as_ref();
        if !folder.is_dir() {
            exn::bail!(ErrorKind::InvalidPath(folder.to_path_buf()));
        }
        let mut changed = Vec::new();
        for path in discover(folder, true, None).await? {
            if self.has_changed(&path).await? {
                changed.push(path);
            }
        }
        debug!(count = changed.len(), "changed files");
        self.scan_paths(&changed, None).await
    }

    async fn has_changed(&self, path: &Path) -> Result<bool> {
        let Some(stored) = self.store.get_by_path(path).await.or_raise(|| ErrorKind::Store)? else {
            return Ok(true);
        };
        let mtime = tokio::fs::metadata(path)
            .await
            .ok()
            .and_then(|meta| meta.modified().ok())
            .map(UtcDateTime::from);
        // The store holds whole seconds; compare at that resolution so an
        // unchanged file is never flagged by its sub-second remainder.
        match (mtime, stored.modified) {
            (Some(on_disk), Some(in_store)) => Ok(on_disk.unix_timestamp() > in_store.unix_timestamp()),
            _ => Ok(true),
        }
    }

    async fn scan_paths(&self, paths: &[PathBuf], progress: Option<Progress<'_>>) -> Result<RunStats> {
        let total = paths.len();
        let mut stats = RunStats { total, ..RunStats::default() };
        let mut current = 0;
        for batch in paths.chunks(self.batch_size) {
            match self.backend.extract_batch(batch).await {
                Ok(records) => {
                    // Pair responses with requested paths by source path;
                    // the backend may omit objects for unreadable files
                    // while the rest of the batch parses.
                    let mut by_source: BTreeMap<PathBuf, RawMetadata> = records
                        .into_iter()
                        .filter_map(|raw| {
                            let source = raw.source_file().map(PathBuf::from)?;
                            Some((source, raw))
                        })
                        .collect();
                    for path in batch {
                        current += 1;
                        match by_source.remove(path) {
                            Some(raw) => match normalize(&raw) {
                                Ok(record) => {
                                    self.store.upsert(&record).await.or_raise(|| ErrorKind::Store)?;
                                    stats.scanned += 1;
                                },
                                Err(err) => {
                                    warn!(path = %path.display(), error = %err, "normalization failed");
                                    stats.failed += 1;
                                },
                            },
                            None => {
                                warn!(path = %path.display(), "backend returned no metadata");
                                stats.failed += 1;
                            },
                        }
                        notify(progress, current, total, path);
                    }
                },
                Err(err) => {
                    // The whole batch is lost but the run goes on.
                    warn!(size = batch.len(), error = %err, "batch extraction failed");
                    stats.failed += batch.len();
                    for path in batch {
                        current += 1;
                        notify(progress, current, total, path);
                    }
                },
            }
        }
        Ok(stats)
    }
}

fn notify(progress: Option<Progress<'_>>, current: usize, total: usize, path: &Path) {
    if let Some(progress) = progress {
        let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
        progress(current, total, &name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metafinder_backend::MockBackend;
    use metafinder_store::{Database, SearchQuery};
    use rstest::rstest;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn touch(path: impl AsRef<Path>) {
        tokio::fs::write(path, b"content").await.unwrap();
    }

    async fn scanner(backend: MockBackend) -> (Database, Scanner<MockBackend>) {
        let db = Database::connect_in_memory().await.unwrap();
        let store = Store::from(&db);
        (db, Scanner::new(backend, store))
    }

    #[rstest]
    #[case(0, 0, 0.0)]
    #[case(3, 3, 100.0)]
    #[case(1, 4, 25.0)]
    fn test_success_rate(#[case] scanned: usize, #[case] total: usize, #[case] expected: f64) {
        let stats = RunStats { scanned, failed: total - scanned, total };
        assert!((stats.success_rate() - expected).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_missing_folder_is_invalid_path() {
        let dir = tempfile::tempdir().unwrap();
        let (db, scanner) = scanner(MockBackend::new()).await;
        assert!(scanner.scan(dir.path().join("nope"), false, None, None).await.is_err());
        db.close().await;
    }

    #[tokio::test]
    async fn test_empty_folder_scans_nothing_and_skips_the_backend() {
        let dir = tempfile::tempdir().unwrap();
        let (db, scanner) = scanner(MockBackend::new()).await;
        let stats = scanner.scan(dir.path(), false, None, None).await.unwrap();
        assert_eq!(stats, RunStats::default());
        assert_eq!(scanner.backend.calls(), 0);
        db.close().await;
    }

    #[tokio::test]
    async fn test_scan_indexes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            touch(dir.path().join(name)).await;
        }
        let (db, scanner) = scanner(MockBackend::new()).await;
        let stats = scanner.scan(dir.path(), false, None, None).await.unwrap();
        assert_eq!(stats, RunStats { scanned: 3, failed: 0, total: 3 });

        let stored = scanner.store.search(&SearchQuery::default()).await.unwrap();
        assert_eq!(stored.len(), 3);
        db.close().await;
    }

    #[tokio::test]
    async fn test_failed_batch_is_counted_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            touch(dir.path().join(name)).await;
        }
        let (db, scanner) = scanner(MockBackend::new().then_fail()).await;
        let stats = scanner.scan(dir.path(), false, None, None).await.unwrap();
        assert_eq!(stats, RunStats { scanned: 0, failed: 3, total: 3 });
        assert!((stats.success_rate() - 0.0).abs() < f64::EPSILON);
        db.close().await;
    }

    #[tokio::test]
    async fn test_small_batches_survive_one_failing_batch() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt", "d.txt"] {
            touch(dir.path().join(name)).await;
        }
        // First batch of two fails, second succeeds.
        let (db, scanner) = scanner(MockBackend::new().then_fail()).await;
        let scanner = scanner.with_batch_size(2);
        let stats = scanner.scan(dir.path(), false, None, None).await.unwrap();
        assert_eq!(stats, RunStats { scanned: 2, failed: 2, total: 4 });
        assert_eq!(scanner.backend.calls(), 2);
        db.close().await;
    }

    #[tokio::test]
    async fn test_progress_reports_every_file_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            touch(dir.path().join(name)).await;
        }
        let (db, scanner) = scanner(MockBackend::new()).await;
        let seen = Mutex::new(Vec::new());
        let progress = |current: usize, total: usize, name: &str| {
            seen.lock().unwrap().push((current, total, name.to_string()));
        };
        scanner.scan(dir.path(), false, None, Some(&progress)).await.unwrap();
        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![
                (1, 3, "a.txt".to_string()),
                (2, 3, "b.txt".to_string()),
                (3, 3, "c.txt".to_string()),
            ]
        );
        db.close().await;
    }

    #[tokio::test]
    async fn test_rescan_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path().join("a.txt")).await;
        touch(dir.path().join("b.txt")).await;
        let (db, scanner) = scanner(MockBackend::new()).await;

        scanner.scan(dir.path(), false, None, None).await.unwrap();
        let mut first = scanner.store.search(&SearchQuery::default()).await.unwrap();
        scanner.scan(dir.path(), false, None, None).await.unwrap();
        let mut second = scanner.store.search(&SearchQuery::default()).await.unwrap();

        // Same path set, every attribute identical except the write stamp.
        first.sort_by(|a, b| a.path.cmp(&b.path));
        second.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(second.len(), 2);
        for (original, rescanned) in first.iter_mut().zip(&second) {
            original.scan_date = rescanned.scan_date;
        }
        assert_eq!(first, second);
        db.close().await;
    }

    #[tokio::test]
    async fn test_rescan_changed_picks_up_only_new_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path().join("old.txt")).await;
        let (db, scanner) = scanner(MockBackend::new()).await;
        scanner.scan(dir.path(), true, None, None).await.unwrap();

        touch(dir.path().join("new.txt")).await;
        let stats = scanner.rescan_changed(dir.path()).await.unwrap();
        assert_eq!(stats.total, 1);
        assert_eq!(stats.scanned, 1);
        assert!(scanner.store.get_by_path(dir.path().join("new.txt")).await.unwrap().is_some());
        db.close().await;
    }

    #[tokio::test]
    async fn test_scan_single_file_does_not_write_to_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        touch(&path).await;
        let (db, scanner) = scanner(MockBackend::new()).await;

        let record = scanner.scan_single_file(&path).await.unwrap().unwrap();
        assert_eq!(record.name, "a.txt");
        assert!(scanner.store.get_by_path(&path).await.unwrap().is_none());
        db.close().await;
    }

    #[tokio::test]
    async fn test_scan_single_file_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        let (db, scanner) = scanner(MockBackend::new()).await;
        assert!(scanner.scan_single_file(dir.path()).await.is_err());
        db.close().await;
    }

    #[tokio::test]
    async fn test_scan_single_file_backend_failure_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        touch(&path).await;
        let (db, scanner) = scanner(MockBackend::new().then_fail()).await;
        assert!(scanner.scan_single_file(&path).await.unwrap().is_none());
        db.close().await;
    }

    #[tokio::test]
    async fn test_partial_batch_response_is_matched_by_source_path() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            touch(dir.path().join(name)).await;
        }
        let record_for = |name: &str| {
            let mut fields = std::collections::BTreeMap::new();
            fields.insert(
                "SourceFile".to_string(),
                serde_json::Value::String(dir.path().join(name).display().to_string()),
            );
            RawMetadata::new(fields)
        };
        // Response omits b.txt and arrives out of order.
        let backend = MockBackend::new().then_records(vec![record_for("c.txt"), record_for("a.txt")]);
        let (db, scanner) = scanner(backend).await;

        let stats = scanner.scan(dir.path(), false, None, None).await.unwrap();
        assert_eq!(stats, RunStats { scanned: 2, failed: 1, total: 3 });
        assert!(scanner.store.get_by_path(dir.path().join("a.txt")).await.unwrap().is_some());
        assert!(scanner.store.get_by_path(dir.path().join("b.txt")).await.unwrap().is_none());
        assert!(scanner.store.get_by_path(dir.path().join("c.txt")).await.unwrap().is_some());
        db.close().await;
    }

    #[tokio::test]
    async fn test_scan_single_file_empty_response_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        touch(&path).await;
        let (db, scanner) = scanner(MockBackend::new().then_records(vec![])).await;
        assert!(scanner.scan_single_file(&path).await.unwrap().is_none());
        db.close().await;
    }

    #[tokio::test]
    async fn test_extension_filter_limits_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path().join("keep.jpg")).await;
        touch(dir.path().join("skip.txt")).await;
        let (db, scanner) = scanner(MockBackend::new()).await;

        let filter = vec![".jpg".to_string()];
        let stats = scanner.scan(dir.path(), false, Some(&filter), None).await.unwrap();
        assert_eq!(stats.total, 1);
        assert!(scanner.store.get_by_path(dir.path().join("skip.txt")).await.unwrap().is_none());
        db.close().await;
    }

    #[tokio::test]
    async fn test_progress_callback_can_count_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            touch(dir.path().join(format!("f{i}.txt"))).await;
        }
        let (db, scanner) = scanner(MockBackend::new()).await;
        let scanner = scanner.with_batch_size(2);
        let calls = AtomicUsize::new(0);
        let progress = |_: usize, _: usize, _: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
        };
        scanner.scan(dir.path(), false, None, Some(&progress)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(scanner.backend.calls(), 3);
        db.close().await;
    }
}
