//! Parsing of metadata date strings.
//!
//! EXIF-style tags write dates with colon-separated components
//! (`2024:01:15 14:30:00`), XMP and document tags tend towards ISO-ish
//! dashes, sometimes with a `T` separator and a trailing zone marker.
//! Only the first 19 characters carry the wall-clock instant, so that is
//! all that gets matched; zone suffixes are deliberately ignored.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{PrimitiveDateTime, UtcDateTime};

/// `YYYY?MM?DD HH:MM:SS` is exactly 19 characters.
const INSTANT_LEN: usize = 19;

const FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]:[month]:[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
];

/// Parse a raw metadata date string into an instant.
///
/// The first format that parses the (truncated) string wins. Unparseable
/// input yields `None`, never an error; a malformed date tag should cost
/// the record its `date_taken`, not the whole normalization.
pub fn parse_metadata_date(raw: &str) -> Option<UtcDateTime> {
    let head = raw.get(..INSTANT_LEN).unwrap_or(raw);
    FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(head, format).ok())
        .map(|instant| instant.assume_utc().to_utc())
}
