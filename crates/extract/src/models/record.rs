use super::FileType;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use time::UtcDateTime;

/// The canonical, normalized representation of one file's metadata.
///
/// One record exists per distinct absolute path; a re-scan of the same
/// path replaces the stored record in full, there is no field-level merge.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Absolute path; the natural key, unique in the store.
    pub path: PathBuf,
    /// File name including extension.
    pub name: String,
    /// Lower-cased extension with leading dot, or empty when the file has none.
    pub extension: String,
    /// Size in bytes; absent when the file vanished before it could be
    /// stat'ed and the backend offered no size hint.
    pub size: Option<u64>,
    pub created: Option<UtcDateTime>,
    pub modified: Option<UtcDateTime>,
    pub accessed: Option<UtcDateTime>,
    pub file_type: FileType,
    /// Author, artist or document creator, depending on the file type.
    pub author: Option<String>,
    pub title: Option<String>,
    /// Capture date for images, creation date for documents and videos.
    pub date_taken: Option<UtcDateTime>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    /// The full cleaned raw metadata; scalars and bounded strings only.
    pub metadata: BTreeMap<String, Value>,
    /// Space-joined projection of the searchable fields. Derived, never
    /// mutated independently of the fields it is built from.
    pub searchable_text: String,
    /// When the record was last written; stamped by the store on upsert.
    pub scan_date: UtcDateTime,
    /// Content hash for duplicate detection. Never computed implicitly.
    pub file_hash: Option<String>,
}
