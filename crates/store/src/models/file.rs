use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use metafinder_extract::{FileRecord, FileType};
use std::path::PathBuf;
use time::UtcDateTime;

/// Row shape of the `files` table. Timestamps are unix seconds, metadata
/// is a JSON document.
#[derive(sqlx::FromRow)]
pub(crate) struct FileRow {
    pub(crate) path: String,
    pub(crate) name: String,
    pub(crate) extension: String,
    pub(crate) size: Option<i64>,
    pub(crate) created: Option<i64>,
    pub(crate) modified: Option<i64>,
    pub(crate) accessed: Option<i64>,
    pub(crate) file_type: String,
    pub(crate) author: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) date_taken: Option<i64>,
    pub(crate) camera_make: Option<String>,
    pub(crate) camera_model: Option<String>,
    pub(crate) metadata: String,
    pub(crate) searchable_text: String,
    pub(crate) scan_date: i64,
    pub(crate) file_hash: Option<String>,
}

fn to_unix(instant: Option<UtcDateTime>) -> Option<i64> {
    instant.map(|t| t.unix_timestamp())
}

fn from_unix(seconds: Option<i64>, field: &'static str) -> Result<Option<UtcDateTime>, Error> {
    seconds
        .map(|s| UtcDateTime::from_unix_timestamp(s).or_raise(|| ErrorKind::InvalidData(field)))
        .transpose()
}

impl TryFrom<&FileRecord> for FileRow {
    type Error = Error;
    fn try_from(record: &FileRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            path: record.path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string(),
            name: record.name.clone(),
            extension: record.extension.clone(),
            size: record
                .size
                .map(|s| i64::try_from(s).or_raise(|| ErrorKind::InvalidData("file size")))
                .transpose()?,
            created: to_unix(record.created),
            modified: to_unix(record.modified),
            accessed: to_unix(record.accessed),
            file_type: record.file_type.to_string(),
            author: record.author.clone(),
            title: record.title.clone(),
            date_taken: to_unix(record.date_taken),
            camera_make: record.camera_make.clone(),
            camera_model: record.camera_model.clone(),
            metadata: serde_json::to_string(&record.metadata).or_raise(|| ErrorKind::InvalidData("metadata"))?,
            searchable_text: record.searchable_text.clone(),
            scan_date: record.scan_date.unix_timestamp(),
            file_hash: record.file_hash.clone(),
        })
    }
}

impl TryFrom<FileRow> for FileRecord {
    type Error = Error;
    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            path: PathBuf::from(row.path),
            name: row.name,
            extension: row.extension,
            size: row
                .size
                .map(|s| u64::try_from(s).or_raise(|| ErrorKind::InvalidData("file size")))
                .transpose()?,
            created: from_unix(row.created, "created date")?,
            modified: from_unix(row.modified, "modified date")?,
            accessed: from_unix(row.accessed, "accessed date")?,
            file_type: row.file_type.parse::<FileType>().or_raise(|| ErrorKind::InvalidData("file type"))?,
            author: row.author,
            title: row.title,
            date_taken: from_unix(row.date_taken, "date taken")?,
            camera_make: row.camera_make,
            camera_model: row.camera_model,
            metadata: serde_json::from_str(&row.metadata).or_raise(|| ErrorKind::InvalidData("metadata"))?,
            searchable_text: row.searchable_text,
            scan_date: UtcDateTime::from_unix_timestamp(row.scan_date)
                .or_raise(|| ErrorKind::InvalidData("scan date"))?,
            file_hash: row.file_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn make_record() -> FileRecord {
        let mut metadata = BTreeMap::new();
        metadata.insert("ISO".to_string(), json!(400));
        FileRecord {
            path: PathBuf::from("/t/photo.jpg"),
            name: "photo.jpg".to_string(),
            extension: ".jpg".to_string(),
            size: Some(2048),
            created: None,
            modified: Some(UtcDateTime::from_unix_timestamp(1_705_329_000).unwrap()),
            accessed: None,
            file_type: FileType::Image,
            author: Some("Jane".to_string()),
            title: None,
            date_taken: None,
            camera_make: Some("Canon".to_string()),
            camera_model: None,
            metadata,
            searchable_text: "photo.jpg Jane Canon".to_string(),
            scan_date: UtcDateTime::from_unix_timestamp(1_705_330_000).unwrap(),
            file_hash: None,
        }
    }

    #[test]
    fn test_model_to_row_and_back() {
        let record = make_record();
        let row = FileRow::try_from(&record).unwrap();
        assert_eq!(row.path, "/t/photo.jpg");
        assert_eq!(row.file_type, "image");
        assert_eq!(row.modified, Some(1_705_329_000));
        assert_eq!(row.metadata, r#"{"ISO":400}"#);
        let restored = FileRecord::try_from(row).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn test_junk_file_type_is_invalid_data() {
        let record = make_record();
        let mut row = FileRow::try_from(&record).unwrap();
        row.file_type = "spreadsheet".to_string();
        assert!(FileRecord::try_from(row).is_err());
    }
}
