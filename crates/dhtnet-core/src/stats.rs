//! Statistics presentation.
//!
//! The firmware's aggregates carry two clocks that must not be mixed:
//! `last_update` is a raw wall-clock timestamp (normalized here like any
//! reading timestamp) and `session_duration` is device uptime. Both are
//! rendered separately and never combined.

use serde::Serialize;

use dhtnet_types::{Statistics, format_utc_ms, normalize};

/// [`Statistics`] plus human-readable renderings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedStatistics {
    #[serde(flatten)]
    pub statistics: Statistics,
    /// Rendering of `last_update`. When the raw value has no canonical
    /// interpretation this is its literal epoch rendering, and
    /// `last_update_valid` marks it untrustworthy.
    #[serde(rename = "lastUpdateFormatted")]
    pub last_update_formatted: String,
    #[serde(rename = "lastUpdateValid")]
    pub last_update_valid: bool,
    /// `session_duration` as `"1h 1m 1s"` style uptime.
    #[serde(rename = "sessionDurationFormatted")]
    pub session_duration_formatted: String,
}

/// Render device-uptime milliseconds as `d/h/m/s`, omitting leading zero
/// units. Zero and negative durations render as `"0s"`.
#[must_use]
pub fn format_duration(ms: i64) -> String {
    let total_secs = ms / 1000;
    if total_secs <= 0 {
        return "0s".to_string();
    }

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || !parts.is_empty() {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 || !parts.is_empty() {
        parts.push(format!("{minutes}m"));
    }
    parts.push(format!("{seconds}s"));
    parts.join(" ")
}

/// Attach formatted renderings to firmware statistics.
#[must_use]
pub fn format_statistics(statistics: Statistics) -> FormattedStatistics {
    let ts = normalize(statistics.last_update as f64);
    let last_update_formatted = ts
        .formatted()
        .or_else(|| format_utc_ms(statistics.last_update))
        .unwrap_or_else(|| "unrepresentable timestamp".to_string());
    let session_duration_formatted = format_duration(statistics.session_duration);
    FormattedStatistics {
        last_update_valid: ts.valid,
        last_update_formatted,
        session_duration_formatted,
        statistics,
    }
}
