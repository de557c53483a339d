//! ISO-8601 timestamp rendering for status reports.

use chrono::DateTime;

/// Format a Unix timestamp as `YYYY-MM-DDTHH:MM:SSZ`.
///
/// An epoch of `0` means "never recorded" (the wall clock was not synced
/// when the reading was taken) and renders as an empty string.
pub fn iso8601_utc(epoch_secs: u64) -> String {
    if epoch_secs == 0 {
        return String::new();
    }
    match DateTime::from_timestamp(epoch_secs as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        None => String::new(),
    }
}
