//! Repository for file metadata records.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::FileRow;
use crate::search::{DEFAULT_LIMIT, Facet, SearchQuery};
use exn::{OptionExt, ResultExt};
use metafinder_extract::{FileRecord, FileType};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use time::UtcDateTime;
use tracing::instrument;

/// Aggregate statistics over the whole store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total_files: u64,
    pub total_size_bytes: u64,
    /// Record count per classification; types with no records are absent.
    pub by_type: BTreeMap<FileType, u64>,
    /// Top 20 extensions by record count, descending.
    pub top_extensions: Vec<(String, u64)>,
    pub oldest_modified: Option<UtcDateTime>,
    pub newest_modified: Option<UtcDateTime>,
}

/// Repository for [`FileRecord`]s in the metadata database.
///
/// One row per distinct absolute path. [`upsert`](Self::upsert) replaces
/// the existing row in full when the path is already known; there is no
/// field-level merge of old and new values. Reads and writes may run
/// concurrently on the same pool; each query observes a consistent
/// snapshot of its own.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl From<&Database> for Store {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl Store {
    /// Create a new store with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // sqlx cannot bind a Path directly; reject non-UTF-8 rather than
    // storing a lossy rendition that would never match on lookup.
    fn path_as_text(path: impl AsRef<Path>) -> Result<String> {
        Ok(path.as_ref().to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string())
    }

    /// Insert a record, or replace the existing record at the same path.
    ///
    /// The replacement is atomic with respect to the path: no reader ever
    /// observes a half-written row, and the FTS index is updated in the
    /// same statement via triggers. `scan_date` is stamped with the write
    /// time; whatever the record carried is ignored.
    ///
    /// Returns the row id of the inserted or replaced record.
    pub async fn upsert(&self, record: &FileRecord) -> Result<i64> {
        let row = FileRow::try_from(record)?;
        let id: i64 = sqlx::query_scalar(include_str!("../queries/upsert_file.sql"))
            .bind(row.path)
            .bind(row.name)
            .bind(row.extension)
            .bind(row.size)
            .bind(row.created)
            .bind(row.modified)
            .bind(row.accessed)
            .bind(row.file_type)
            .bind(row.author)
            .bind(row.title)
            .bind(row.date_taken)
            .bind(row.camera_make)
            .bind(row.camera_model)
            .bind(row.metadata)
            .bind(row.searchable_text)
            .bind(UtcDateTime::now().unix_timestamp())
            .bind(row.file_hash)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(id)
    }

    /// Exact lookup by absolute path.
    pub async fn get_by_path(&self, path: impl AsRef<Path>) -> Result<Option<FileRecord>> {
        let row: Option<FileRow> = sqlx::query_as(include_str!("../queries/get_by_path.sql"))
            .bind(Self::path_as_text(path)?)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(FileRecord::try_from).transpose()
    }

    /// Search with conjunctive predicates, ordered by modification time
    /// descending, truncated to the query's limit.
    #[instrument(skip_all)]
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<FileRecord>> {
        let limit = i64::try_from(query.limit.unwrap_or(DEFAULT_LIMIT)).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let min_size =
            query.min_size.map(|s| i64::try_from(s).or_raise(|| ErrorKind::InvalidData("size bound"))).transpose()?;
        let max_size =
            query.max_size.map(|s| i64::try_from(s).or_raise(|| ErrorKind::InvalidData("size bound"))).transpose()?;

        // Text with no tokens (empty or all whitespace) has nothing to
        // match and would be an FTS5 syntax error; treat it as no filter.
        let text = query.text.as_deref().and_then(fts_expression);

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT files.* FROM files");
        if text.is_some() {
            builder.push(" JOIN files_fts ON files_fts.rowid = files.id");
        }
        builder.push(" WHERE 1 = 1");
        if let Some(file_type) = query.file_type {
            builder.push(" AND files.file_type = ").push_bind(file_type.to_string());
        }
        if let Some(extension) = &query.extension {
            builder.push(" AND files.extension = ").push_bind(extension.to_lowercase());
        }
        if let Some(author) = &query.author {
            builder.push(" AND files.author LIKE ").push_bind(format!("%{author}%"));
        }
        if let Some(camera_make) = &query.camera_make {
            builder.push(" AND files.camera_make LIKE ").push_bind(format!("%{camera_make}%"));
        }
        if let Some(min_size) = min_size {
            builder.push(" AND files.size >= ").push_bind(min_size);
        }
        if let Some(max_size) = max_size {
            builder.push(" AND files.size <= ").push_bind(max_size);
        }
        if let Some(after) = query.modified_after {
            builder.push(" AND files.modified >= ").push_bind(after.unix_timestamp());
        }
        if let Some(before) = query.modified_before {
            builder.push(" AND files.modified <= ").push_bind(before.unix_timestamp());
        }
        if let Some(expression) = text {
            builder.push(" AND files_fts MATCH ").push_bind(expression);
        }
        builder.push(" ORDER BY files.modified DESC LIMIT ").push_bind(limit);

        let rows: Vec<FileRow> =
            builder.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(FileRecord::try_from).collect()
    }

    /// Aggregate statistics over all stored records.
    pub async fn statistics(&self) -> Result<Statistics> {
        let (total_files, total_size_bytes, oldest, newest): (i64, i64, Option<i64>, Option<i64>) =
            sqlx::query_as(include_str!("../queries/stats_totals.sql"))
                .fetch_one(&self.pool)
                .await
                .or_raise(|| ErrorKind::Database)?;
        let by_type_rows: Vec<(String, i64)> = sqlx::query_as(include_str!("../queries/stats_by_type.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut by_type = BTreeMap::new();
        for (label, count) in by_type_rows {
            let file_type = label.parse::<FileType>().or_raise(|| ErrorKind::InvalidData("file type"))?;
            by_type.insert(file_type, count as u64);
        }
        let top_extensions: Vec<(String, i64)> = sqlx::query_as(include_str!("../queries/stats_top_extensions.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(Statistics {
            total_files: total_files as u64,
            total_size_bytes: total_size_bytes as u64,
            by_type,
            top_extensions: top_extensions.into_iter().map(|(ext, count)| (ext, count as u64)).collect(),
            oldest_modified: oldest
                .map(|s| UtcDateTime::from_unix_timestamp(s).or_raise(|| ErrorKind::InvalidData("modified date")))
                .transpose()?,
            newest_modified: newest
                .map(|s| UtcDateTime::from_unix_timestamp(s).or_raise(|| ErrorKind::InvalidData("modified date")))
                .transpose()?,
        })
    }

    /// Distinct non-empty values of a facet column, ordered by descending
    /// occurrence count. Used to populate filter dropdowns.
    ///
    /// The column name comes from the closed [`Facet`] enum, never from
    /// caller-supplied strings.
    pub async fn unique_values(&self, facet: Facet, limit: usize) -> Result<Vec<String>> {
        let limit = i64::try_from(limit).or_raise(|| ErrorKind::InvalidData("limit"))?;
        let column = facet.column();
        let sql = format!(
            "SELECT {column} AS value, COUNT(*) AS count FROM files \
             WHERE {column} IS NOT NULL AND {column} != '' \
             GROUP BY {column} ORDER BY count DESC, value ASC LIMIT ?"
        );
        let values: Vec<String> = sqlx::query_scalar(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(values)
    }
}

/// Quote each whitespace-separated token so caller input can never be
/// misread as FTS query syntax (`AND`, `*`, column filters). `None` when
/// the text contains no tokens at all.
fn fts_expression(text: &str) -> Option<String> {
    let tokens: Vec<String> =
        text.split_whitespace().map(|token| format!("\"{}\"", token.replace('"', "\"\""))).collect();
    (!tokens.is_empty()).then(|| tokens.join(" "))
}
