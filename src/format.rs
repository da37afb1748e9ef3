//! Human-readable sizes, display names and storage timestamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// Suffix a selected file must carry.
pub const PACKAGE_EXTENSION: &str = ".apk";

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count in the largest unit where the value is at least 1,
/// rounded to two decimals with trailing zeros dropped.
///
/// Rounding can carry a value up to 1024 (`1048575` is `1023.999 KB`), in
/// which case the next unit is used instead.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    while unit + 1 < SIZE_UNITS.len() && bytes >= 1024u64.pow(unit as u32 + 1) {
        unit += 1;
    }

    let mut value = round_hundredths(bytes as f64 / 1024f64.powi(unit as i32));
    if value >= 1024.0 && unit + 1 < SIZE_UNITS.len() {
        unit += 1;
        value = round_hundredths(bytes as f64 / 1024f64.powi(unit as i32));
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Derive a display name from a package filename: `my_cool-app.apk` becomes
/// `My cool app`.
pub fn default_display_name(filename: &str) -> String {
    let stem = filename.strip_suffix(PACKAGE_EXTENSION).unwrap_or(filename);
    let spaced = stem.replace(['-', '_'], " ");

    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// ISO-8601 time with `:` and `.` replaced by `-`, cut to whole seconds:
/// `2024-03-05T14-07-09`.
pub fn storage_timestamp(at: DateTime<Utc>) -> String {
    iso_timestamp(at)
        .replace([':', '.'], "-")
        .chars()
        .take(19)
        .collect()
}

/// Millisecond-precision UTC timestamp used in commit messages.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
