//! Shared utility functions used across the codebase.

use chrono::{DateTime, SecondsFormat, Utc};

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// RFC 3339 UTC timestamp with millisecond precision, e.g.
/// `2026-03-01T12:00:00.000Z`.
pub fn rfc3339_millis(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_rfc3339() -> String {
    rfc3339_millis(Utc::now())
}

/// Filesystem-safe variant of an RFC 3339 timestamp (`:` and `.` become `-`).
pub fn file_stamp(at: DateTime<Utc>) -> String {
    rfc3339_millis(at).replace([':', '.'], "-")
}
