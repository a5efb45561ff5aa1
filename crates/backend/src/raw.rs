//! Typed adapter over one raw metadata object returned by the backend.
//!
//! The backend speaks flat JSON objects keyed by its own field names
//! (`SourceFile`, `MIMEType`, `EXIF:Make`, ...). Rather than threading an
//! untyped map through the whole pipeline, the well-known lookups live here
//! at the boundary and everything downstream works through these accessors.

use serde_json::Value;
use std::collections::BTreeMap;

/// One raw metadata record for a single file, as produced by the backend.
///
/// Values are scalars or short strings; nested structures do not occur in
/// practice but are preserved untouched if they do (the normalizer decides
/// what survives into persistent storage).
#[derive(Debug, Clone, Default)]
pub struct RawMetadata {
    fields: BTreeMap<String, Value>,
}

impl RawMetadata {
    pub fn new(fields: BTreeMap<String, Value>) -> Self {
        Self { fields }
    }

    /// The path of the file this record describes.
    ///
    /// Every well-formed backend response carries this key; a record
    /// without it cannot be attributed to a file and fails normalization.
    pub fn source_file(&self) -> Option<&str> {
        self.fields.get("SourceFile").and_then(Value::as_str)
    }

    /// The MIME type the backend detected, if any.
    pub fn mime_type(&self) -> Option<&str> {
        self.first_str(&["MIMEType", "File:MIMEType"])
    }

    /// File size in bytes as reported by the backend.
    ///
    /// Only used as a fallback when the file has vanished between discovery
    /// and extraction and can no longer be stat'ed.
    pub fn size_hint(&self) -> Option<u64> {
        self.fields.get("FileSize").and_then(Value::as_u64)
    }

    /// Raw value lookup by exact key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// First present value among an ordered list of alias keys, as `&str`.
    pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.fields.get(*key).and_then(Value::as_str))
    }

    /// First present non-empty value among an ordered list of alias keys,
    /// rendered as an owned string.
    ///
    /// Accepts strings and numbers; anything else (arrays, objects) is
    /// skipped, matching the "scalar fields only" contract of the backend.
    pub fn first_string(&self, keys: &[&str]) -> Option<String> {
        keys.iter()
            .filter_map(|key| self.fields.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, Value> {
        self.fields
    }
}

impl From<serde_json::Map<String, Value>> for RawMetadata {
    fn from(object: serde_json::Map<String, Value>) -> Self {
        Self { fields: object.into_iter().collect() }
    }
}
