//! Normalization of raw backend metadata into [`FileRecord`]s.

use crate::classify::classify;
use crate::dates::parse_metadata_date;
use crate::error::{ErrorKind, Result};
use crate::models::{FileRecord, FileType};
use exn::OptionExt;
use metafinder_backend::RawMetadata;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use time::UtcDateTime;
use tracing::instrument;

/// String values longer than this are dropped from the stored metadata;
/// they are embedded payloads (thumbnails, ICC profiles), not metadata.
const METADATA_VALUE_CEILING: usize = 10_000;
/// Backend bookkeeping fields that never belong in a stored record.
const INTERNAL_NAMESPACE: &str = "System:";
/// The backend renders binary tag payloads as a marker string.
const BINARY_MARKER: &str = "(Binary data";
/// Descriptive keys folded into the searchable text when present.
const DESCRIPTIVE_KEYS: &[&str] = &["Keywords", "Tags", "Description", "Comment", "Subject"];

/// Map one raw metadata record into the canonical schema.
///
/// Deterministic apart from re-statting the source path for filesystem
/// facts. A vanished file is not an error: size falls back to the backend's
/// hint and the timestamps stay absent. The only failure is a record
/// without a source path, which cannot be attributed to any file.
///
/// `file_hash` is always left absent; content hashing is a separate,
/// explicit operation (see [`crate::hash`]).
#[instrument(skip(raw), fields(source = raw.source_file()))]
pub fn normalize(raw: &RawMetadata) -> Result<FileRecord> {
    let source = raw.source_file().ok_or_raise(|| ErrorKind::MissingSourceFile)?;
    let path = absolute(Path::new(source));
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    let (size, created, modified, accessed) = match std::fs::metadata(&path) {
        Ok(stat) => (
            Some(stat.len()),
            timestamp(stat.created()),
            timestamp(stat.modified()),
            timestamp(stat.accessed()),
        ),
        // Deleted between discovery and extraction; never fatal.
        Err(_) => (raw.size_hint(), None, None, None),
    };

    let file_type = classify(raw.mime_type(), &extension);
    let common = CommonFields::extract(file_type, raw);
    let metadata = clean_metadata(raw);
    let searchable_text = build_searchable_text(&name, &common, &metadata);

    Ok(FileRecord {
        path,
        name,
        extension,
        size,
        created,
        modified,
        accessed,
        file_type,
        author: common.author,
        title: common.title,
        date_taken: common.date_taken,
        camera_make: common.camera_make,
        camera_model: common.camera_model,
        metadata,
        searchable_text,
        scan_date: UtcDateTime::now(),
        file_hash: None,
    })
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn timestamp(time: std::io::Result<SystemTime>) -> Option<UtcDateTime> {
    // Not every filesystem records every timestamp (btime in particular).
    time.ok().map(UtcDateTime::from)
}

/// The optional searchable fields, populated per file type from ordered
/// alias lists. Each lookup is independent; absence never fails anything.
#[derive(Default)]
struct CommonFields {
    author: Option<String>,
    title: Option<String>,
    date_taken: Option<UtcDateTime>,
    camera_make: Option<String>,
    camera_model: Option<String>,
}

impl CommonFields {
    fn extract(file_type: FileType, raw: &RawMetadata) -> Self {
        match file_type {
            FileType::Image => Self {
                camera_make: raw.first_string(&["Make", "EXIF:Make"]),
                camera_model: raw.first_string(&["Model", "EXIF:Model"]),
                date_taken: date(raw, &["DateTimeOriginal", "CreateDate", "EXIF:DateTimeOriginal"]),
                author: raw.first_string(&["Artist", "Creator", "EXIF:Artist"]),
                title: raw.first_string(&["Title", "XMP:Title"]),
                ..Self::default()
            },
            FileType::Document => Self {
                author: raw.first_string(&["Author", "Creator", "PDF:Author", "XMP:Creator"]),
                title: raw.first_string(&["Title", "PDF:Title", "XMP:Title"]),
                date_taken: date(raw, &["CreateDate", "CreationDate", "PDF:CreateDate"]),
                ..Self::default()
            },
            FileType::Audio => Self {
                author: raw.first_string(&["Artist", "ID3:Artist", "Vorbis:Artist"]),
                title: raw.first_string(&["Title", "ID3:Title", "Vorbis:Title"]),
                ..Self::default()
            },
            FileType::Video => Self {
                date_taken: date(raw, &["CreateDate", "CreationDate", "QuickTime:CreateDate"]),
                title: raw.first_string(&["Title", "QuickTime:Title"]),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

fn date(raw: &RawMetadata, keys: &[&str]) -> Option<UtcDateTime> {
    raw.first_str(keys).and_then(parse_metadata_date)
}

/// Clean the raw map for persistent storage: drop binary payload markers,
/// oversized strings, and internal-namespace keys.
fn clean_metadata(raw: &RawMetadata) -> BTreeMap<String, Value> {
    raw.fields()
        .iter()
        .filter(|(key, value)| {
            if key.starts_with(INTERNAL_NAMESPACE) {
                return false;
            }
            match value {
                Value::String(s) => s.len() <= METADATA_VALUE_CEILING && !s.starts_with(BINARY_MARKER),
                _ => true,
            }
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Join the searchable fields, then the descriptive metadata keys, in
/// fixed order with single spaces; absent values are skipped.
fn build_searchable_text(name: &str, common: &CommonFields, metadata: &BTreeMap<String, Value>) -> String {
    let mut parts: Vec<String> = [
        Some(name),
        common.author.as_deref(),
        common.title.as_deref(),
        common.camera_make.as_deref(),
        common.camera_model.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .map(str::to_string)
    .collect();
    for key in DESCRIPTIVE_KEYS {
        if let Some(value) = metadata.get(*key)
            && let Some(text) = value_text(value)
        {
            parts.push(text);
        }
    }
    parts.join(" ")
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        // Keyword lists arrive as arrays of scalars.
        Value::Array(items) => {
            let joined = items.iter().filter_map(value_text).collect::<Vec<_>>().join(" ");
            (!joined.is_empty()).then_some(joined)
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn raw(value: Value) -> RawMetadata {
        let Value::Object(object) = value else {
            panic!("test fixture must be a JSON object");
        };
        RawMetadata::from(object)
    }

    fn temp_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path).unwrap().write_all(contents).unwrap();
        path
    }

    #[test]
    fn test_missing_source_path_fails() {
        assert!(normalize(&raw(json!({"MIMEType": "image/jpeg"}))).is_err());
    }

    #[test]
    fn test_image_normalization_scenario() {
        let record = normalize(&raw(json!({
            "SourceFile": "/t/photo.jpg",
            "MIMEType": "image/jpeg",
            "Make": "Canon",
            "Model": "EOS 5D Mark IV",
            "DateTimeOriginal": "2024:01:15 14:30:00",
            "Artist": "John Photographer",
            "Title": "Test Photo",
        })))
        .unwrap();
        assert_eq!(record.file_type, FileType::Image);
        assert_eq!(record.name, "photo.jpg");
        assert_eq!(record.extension, ".jpg");
        assert_eq!(record.camera_make.as_deref(), Some("Canon"));
        assert_eq!(record.camera_model.as_deref(), Some("EOS 5D Mark IV"));
        assert_eq!(record.author.as_deref(), Some("John Photographer"));
        assert_eq!(record.title.as_deref(), Some("Test Photo"));
        assert_eq!(record.date_taken, Some(UtcDateTime::from_unix_timestamp(1_705_329_000).unwrap()));
        assert!(record.file_hash.is_none());
    }

    #[test]
    fn test_vanished_file_uses_size_hint_and_absent_timestamps() {
        let record = normalize(&raw(json!({
            "SourceFile": "/definitely/not/here.pdf",
            "FileSize": 4096,
        })))
        .unwrap();
        assert_eq!(record.size, Some(4096));
        assert!(record.created.is_none());
        assert!(record.modified.is_none());
        assert!(record.accessed.is_none());
    }

    #[test]
    fn test_existing_file_is_statted() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_file(&dir, "notes.txt", b"twelve bytes");
        let record = normalize(&raw(json!({"SourceFile": path.to_str().unwrap()}))).unwrap();
        assert_eq!(record.size, Some(12));
        assert!(record.modified.is_some());
        assert_eq!(record.file_type, FileType::Document);
    }

    #[test]
    fn test_mime_beats_extension() {
        let record = normalize(&raw(json!({
            "SourceFile": "/t/mislabelled.txt",
            "MIMEType": "image/jpeg",
        })))
        .unwrap();
        assert_eq!(record.file_type, FileType::Image);
    }

    #[test]
    fn test_unmapped_everything_is_unknown() {
        let record = normalize(&raw(json!({"SourceFile": "/t/blob.xyz"}))).unwrap();
        assert_eq!(record.file_type, FileType::Unknown);
    }

    #[test]
    fn test_metadata_cleaning() {
        let oversized = "x".repeat(METADATA_VALUE_CEILING + 1);
        let record = normalize(&raw(json!({
            "SourceFile": "/t/photo.jpg",
            "ThumbnailImage": "(Binary data 4213 bytes, use -b option to extract)",
            "LongField": oversized,
            "System:FileAttributes": "rw-r--r--",
            "ISO": 400,
        })))
        .unwrap();
        assert!(!record.metadata.contains_key("ThumbnailImage"));
        assert!(!record.metadata.contains_key("LongField"));
        assert!(!record.metadata.contains_key("System:FileAttributes"));
        assert_eq!(record.metadata.get("ISO"), Some(&json!(400)));
        assert_eq!(record.metadata.get("SourceFile"), Some(&json!("/t/photo.jpg")));
    }

    #[test]
    fn test_searchable_text_order_and_skipping() {
        let record = normalize(&raw(json!({
            "SourceFile": "/t/photo.jpg",
            "MIMEType": "image/jpeg",
            "Make": "Canon",
            "Artist": "Jane",
            "Keywords": ["holiday", "beach"],
            "Comment": "blue hour",
        })))
        .unwrap();
        // name, author, (no title), make, (no model), then descriptive keys.
        assert_eq!(record.searchable_text, "photo.jpg Jane Canon holiday beach blue hour");
    }

    #[test]
    fn test_audio_aliases() {
        let record = normalize(&raw(json!({
            "SourceFile": "/t/song.mp3",
            "MIMEType": "audio/mpeg",
            "ID3:Artist": "The Band",
            "Title": "Opening Track",
        })))
        .unwrap();
        assert_eq!(record.author.as_deref(), Some("The Band"));
        assert_eq!(record.title.as_deref(), Some("Opening Track"));
        assert!(record.camera_make.is_none());
    }

    #[test]
    fn test_video_creation_date() {
        let record = normalize(&raw(json!({
            "SourceFile": "/t/clip.mp4",
            "MIMEType": "video/mp4",
            "QuickTime:CreateDate": "2024-01-15 14:30:00",
        })))
        .unwrap();
        assert_eq!(record.date_taken, Some(UtcDateTime::from_unix_timestamp(1_705_329_000).unwrap()));
    }

    #[test]
    fn test_malformed_date_is_absent_not_fatal() {
        let record = normalize(&raw(json!({
            "SourceFile": "/t/photo.jpg",
            "MIMEType": "image/jpeg",
            "DateTimeOriginal": "0000:00:00 00:00:00",
        })))
        .unwrap();
        assert!(record.date_taken.is_none());
    }
}
