//! Search predicates and facet definitions.

use metafinder_extract::FileType;
use time::UtcDateTime;

/// Applied when a query does not specify its own limit.
pub const DEFAULT_LIMIT: usize = 100;

/// Conjunctive search predicates; every populated field must match.
///
/// An entirely empty query is valid and returns the most recently
/// modified records up to the limit.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Exact match on the classification.
    pub file_type: Option<FileType>,
    /// Exact match on the lower-cased extension (leading dot included).
    pub extension: Option<String>,
    /// Case-insensitive substring match on the author.
    pub author: Option<String>,
    /// Case-insensitive substring match on the camera manufacturer.
    pub camera_make: Option<String>,
    /// Inclusive lower bound on size in bytes.
    pub min_size: Option<u64>,
    /// Inclusive upper bound on size in bytes.
    pub max_size: Option<u64>,
    /// Inclusive lower bound on the modification time.
    pub modified_after: Option<UtcDateTime>,
    /// Inclusive upper bound on the modification time.
    pub modified_before: Option<UtcDateTime>,
    /// Free-text query against the full-text index
    /// (name, author, title, keywords).
    pub text: Option<String>,
    /// Maximum number of results; [`DEFAULT_LIMIT`] when unset.
    pub limit: Option<usize>,
}

/// Fields that support distinct-value listing for filter facets.
///
/// A closed enum rather than a column-name string: this is the allow-list
/// that keeps caller input out of the generated SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Author,
    CameraMake,
    CameraModel,
    Extension,
    FileType,
}

impl Facet {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::CameraMake => "camera_make",
            Self::CameraModel => "camera_model",
            Self::Extension => "extension",
            Self::FileType => "file_type",
        }
    }
}
