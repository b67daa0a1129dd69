//! Utility functions for the lobby herald

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Format a lobby uptime as `45s` or `3m 12s`
pub fn format_uptime(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Truncate text longer than `max_chars` to `keep_chars` followed by "..."
pub fn truncate_with_ellipsis(text: &str, max_chars: usize, keep_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(keep_chars).collect();
        format!("{}...", truncated)
    }
}

/// Describe how long ago `then` was relative to `now` (`12s ago`, `5m ago`, ...)
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(then).num_seconds().max(0);

    if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86400 {
        format!("{}h ago", seconds / 3600)
    } else {
        format!("{}d ago", seconds / 86400)
    }
}
