use derive_more::Display;
use std::str::FromStr;

/// Closed classification of indexed files.
///
/// Derived deterministically from the backend's MIME type (preferred) or
/// the file extension; anything unmapped is [`Unknown`](Self::Unknown).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileType {
    #[display("image")]
    Image,
    #[display("document")]
    Document,
    #[display("audio")]
    Audio,
    #[display("video")]
    Video,
    #[display("archive")]
    Archive,
    #[display("executable")]
    Executable,
    #[display("code")]
    Code,
    #[display("unknown")]
    Unknown,
}

impl FromStr for FileType {
    type Err = UnknownFileType;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(Self::Image),
            "document" => Ok(Self::Document),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "archive" => Ok(Self::Archive),
            "executable" => Ok(Self::Executable),
            "code" => Ok(Self::Code),
            "unknown" => Ok(Self::Unknown),
            other => Err(UnknownFileType(other.to_string())),
        }
    }
}

/// A string that does not name a member of the closed [`FileType`] set.
#[derive(Debug, Display, derive_more::Error)]
#[display("not a known file type: {_0}")]
pub struct UnknownFileType(#[error(not(source))] String);
