//! Deterministic file type classification.
//!
//! Two fixed tables: MIME type first, extension as fallback. The MIME table
//! always wins when both are present and disagree, because the backend's
//! content sniffing is more trustworthy than whatever the file is named.

use crate::models::FileType;

const MIME_TABLE: &[(FileType, &[&str])] = &[
    (FileType::Image, &["image/jpeg", "image/png", "image/gif", "image/bmp", "image/tiff", "image/webp"]),
    (FileType::Document, &[
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/vnd.ms-excel",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "application/vnd.ms-powerpoint",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    ]),
    (FileType::Audio, &["audio/mpeg", "audio/mp4", "audio/x-wav", "audio/flac", "audio/ogg"]),
    (FileType::Video, &["video/mp4", "video/x-msvideo", "video/x-matroska", "video/quicktime", "video/x-ms-wmv"]),
    (FileType::Archive, &[
        "application/zip",
        "application/x-rar-compressed",
        "application/x-7z-compressed",
        "application/x-tar",
    ]),
    (FileType::Executable, &["application/x-msdownload", "application/x-executable"]),
];

const EXTENSION_TABLE: &[(FileType, &[&str])] = &[
    (FileType::Image, &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".webp", ".raw", ".cr2", ".nef"]),
    (FileType::Document, &[".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".rtf"]),
    (FileType::Audio, &[".mp3", ".wav", ".flac", ".m4a", ".aac", ".ogg", ".wma"]),
    (FileType::Video, &[".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm"]),
    (FileType::Archive, &[".zip", ".rar", ".7z", ".tar", ".gz", ".bz2"]),
    (FileType::Executable, &[".exe", ".dll", ".so", ".dylib"]),
    (FileType::Code, &[".py", ".js", ".java", ".cpp", ".c", ".h", ".cs", ".php", ".rb", ".go", ".rs"]),
];

/// Classify a file from its detected MIME type and lower-cased extension
/// (leading dot included, empty when absent).
pub fn classify(mime_type: Option<&str>, extension: &str) -> FileType {
    mime_type
        .and_then(from_mime)
        .or_else(|| from_extension(extension))
        .unwrap_or(FileType::Unknown)
}

fn from_mime(mime_type: &str) -> Option<FileType> {
    lookup(MIME_TABLE, mime_type)
}

fn from_extension(extension: &str) -> Option<FileType> {
    lookup(EXTENSION_TABLE, extension)
}

fn lookup(table: &[(FileType, &[&str])], needle: &str) -> Option<FileType> {
    table
        .iter()
        .find(|(_, entries)| entries.contains(&needle))
        .map(|(file_type, _)| *file_type)
}
