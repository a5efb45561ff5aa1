//! Normalization of raw backend metadata into the canonical schema.
//!
//! The extraction backend hands back heterogeneous key-value maps whose
//! field names depend on the file format (EXIF groups for images, PDF/XMP
//! conventions for documents, ID3/Vorbis for audio). This crate maps each
//! raw record plus filesystem facts into one fixed [`FileRecord`] shape:
//!
//! - deterministic [`FileType`] classification (MIME table first, extension
//!   table second, [`FileType::Unknown`] otherwise)
//! - type-specific extraction of the common searchable fields from ordered
//!   alias lists
//! - lenient date parsing (unparseable dates are absent, never errors)
//! - metadata cleaning (no binary payloads, bounded string sizes)
//!
//! Content hashing lives in [`hash`] and is only ever invoked explicitly.

mod classify;
mod dates;
pub mod error;
pub mod hash;
pub mod models;
mod normalize;

pub use crate::classify::classify;
pub use crate::dates::parse_metadata_date;
pub use crate::models::{FileRecord, FileType};
pub use crate::normalize::normalize;
