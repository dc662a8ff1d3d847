//! Formatting helpers shared by the interchange form and the CLI.
//!
//! Long free-text fields stay lossless in memory. The caps below are applied
//! only when a record crosses the serialization boundary.

use serde::Serializer;

/// Cap for tool results and decision descriptions.
pub const SHORT_TEXT_CAP: usize = 200;

/// Cap for error messages and file snippets.
pub const LONG_TEXT_CAP: usize = 500;

/// Truncate to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `serialize_with` helper for fields capped at [`SHORT_TEXT_CAP`].
pub fn cap_short<S: Serializer>(text: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(truncate_chars(text, SHORT_TEXT_CAP))
}

/// `serialize_with` helper for fields capped at [`LONG_TEXT_CAP`].
pub fn cap_long<S: Serializer>(text: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(truncate_chars(text, LONG_TEXT_CAP))
}

/// Format a minute count for display (e.g., "1h 05m", "12.5m").
pub fn format_minutes(minutes: f64) -> String {
    // Round to the displayed precision first so 59.97 reads as 1h 00m
    let tenths = (minutes * 10.0).round() / 10.0;
    if tenths >= 60.0 {
        let total = minutes.round() as u64;
        format!("{}h {:02}m", total / 60, total % 60)
    } else {
        format!("{:.1}m", tenths)
    }
}
