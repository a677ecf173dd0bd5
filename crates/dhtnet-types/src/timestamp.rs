//! Timestamp normalization for field-device readings.
//!
//! ESP8266 nodes report timestamps in three encodings, depending on whether
//! NTP has locked by the time a reading is transmitted:
//!
//! - epoch **milliseconds** (13+ decimal digits) - the intended format
//! - epoch **seconds** (10-12 digits) - firmware paths that skip the `* 1000`
//! - a bare **uptime counter** (fewer than 10 digits) - millis since boot,
//!   not convertible to wall-clock time at all
//!
//! Naively formatting the last two as epoch-milliseconds renders 1970 dates
//! that look plausible on a dashboard. [`normalize`] classifies the raw value
//! by decimal digit length and tags anything whose canonical year falls
//! outside [`MIN_VALID_YEAR`]..=[`MAX_VALID_YEAR`] as invalid, so downstream
//! layers can never silently misinterpret an unsynchronized clock.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

/// Earliest canonical year accepted as a valid wall-clock timestamp.
pub const MIN_VALID_YEAR: i32 = 2020;
/// Latest canonical year accepted as a valid wall-clock timestamp.
pub const MAX_VALID_YEAR: i32 = 2035;

/// How a raw timestamp value was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimestampClass {
    /// Already epoch milliseconds (13+ digits).
    #[serde(rename = "ms")]
    Millis,
    /// Epoch seconds (10-12 digits); canonical value is `raw * 1000`.
    #[serde(rename = "seconds")]
    Seconds,
    /// Device-uptime tick count (fewer than 10 digits); no wall-clock
    /// meaning without an external epoch anchor.
    #[serde(rename = "deviceUptime")]
    DeviceUptime,
    /// Not a usable number (non-finite or negative).
    #[serde(rename = "invalid")]
    Invalid,
}

impl core::fmt::Display for TimestampClass {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TimestampClass::Millis => write!(f, "ms"),
            TimestampClass::Seconds => write!(f, "seconds"),
            TimestampClass::DeviceUptime => write!(f, "deviceUptime"),
            TimestampClass::Invalid => write!(f, "invalid"),
        }
    }
}

/// Result of normalizing a raw timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizedTimestamp {
    /// Canonical epoch milliseconds, when derivable from the raw value.
    pub canonical_ms: Option<i64>,
    /// Which encoding the raw value matched.
    pub classification: TimestampClass,
    /// True only when a canonical value exists and its UTC year falls
    /// within the plausible window.
    pub valid: bool,
}

impl NormalizedTimestamp {
    fn invalid(classification: TimestampClass) -> Self {
        Self {
            canonical_ms: None,
            classification,
            valid: false,
        }
    }

    /// Canonical UTC rendering (`YYYY-MM-DD HH:mm:ss UTC`), when derivable.
    pub fn formatted(&self) -> Option<String> {
        self.canonical_ms.and_then(format_utc_ms)
    }
}

/// Classify a raw timestamp by digit length and convert it to canonical
/// epoch milliseconds.
///
/// The input must be a finite, non-negative number; anything else yields
/// [`TimestampClass::Invalid`] with no canonical value. A canonical value
/// whose UTC year falls outside `[MIN_VALID_YEAR, MAX_VALID_YEAR]` keeps its
/// classification but is marked invalid - this is the 1970-epoch and
/// drifted-clock defense.
///
/// # Examples
///
/// ```
/// use dhtnet_types::{TimestampClass, normalize};
///
/// // 13 digits: already milliseconds
/// let ts = normalize(1_700_000_000_000.0);
/// assert_eq!(ts.canonical_ms, Some(1_700_000_000_000));
/// assert!(ts.valid);
///
/// // 10 digits: seconds, scaled up
/// let ts = normalize(1_700_000_000.0);
/// assert_eq!(ts.classification, TimestampClass::Seconds);
/// assert_eq!(ts.canonical_ms, Some(1_700_000_000_000));
///
/// // short: uptime counter, never wall-clock
/// let ts = normalize(50_000.0);
/// assert_eq!(ts.classification, TimestampClass::DeviceUptime);
/// assert!(!ts.valid);
/// ```
#[must_use]
pub fn normalize(raw: f64) -> NormalizedTimestamp {
    if !raw.is_finite() || raw < 0.0 || raw >= i64::MAX as f64 {
        return NormalizedTimestamp::invalid(TimestampClass::Invalid);
    }

    let value = raw.trunc() as i64;
    let digits = decimal_digits(value);

    let (classification, canonical_ms) = if digits >= 13 {
        (TimestampClass::Millis, Some(value))
    } else if digits >= 10 {
        (TimestampClass::Seconds, value.checked_mul(1000))
    } else {
        return NormalizedTimestamp::invalid(TimestampClass::DeviceUptime);
    };

    let valid = canonical_ms
        .and_then(utc_year)
        .is_some_and(|year| (MIN_VALID_YEAR..=MAX_VALID_YEAR).contains(&year));

    NormalizedTimestamp {
        canonical_ms,
        classification,
        valid,
    }
}

/// Format epoch milliseconds as `YYYY-MM-DD HH:mm:ss UTC`.
///
/// Returns `None` when the value is outside the representable date range.
#[must_use]
pub fn format_utc_ms(ms: i64) -> Option<String> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    let dt = OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()?;
    dt.format(&format).ok()
}

fn decimal_digits(value: i64) -> u32 {
    value.checked_ilog10().map_or(1, |log| log + 1)
}

fn utc_year(ms: i64) -> Option<i32> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .map(|dt| dt.year())
}
