mod file_type;
mod record;

pub use self::file_type::{FileType, UnknownFileType};
pub use self::record::FileRecord;
