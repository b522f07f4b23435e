//! Formatting helpers shared by CLI commands

use chrono::{DateTime, Utc};

/// Format a timestamp as a short date
pub fn format_date(dt: &DateTime<Utc>) -> String {
    dt.format("%-m/%-d/%Y").to_string()
}

/// Format a timestamp with time of day
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%-m/%-d/%Y %H:%M").to_string()
}

/// Shorten a string for table cells
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
