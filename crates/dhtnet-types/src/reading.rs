//! Sensor observation types.

use serde::{Deserialize, Serialize};

use crate::timestamp::{NormalizedTimestamp, TimestampClass, normalize};

/// Lowest plausible temperature reading in degrees Celsius.
pub const TEMPERATURE_MIN: f64 = -40.0;
/// Highest plausible temperature reading in degrees Celsius.
pub const TEMPERATURE_MAX: f64 = 80.0;
/// Lowest plausible relative humidity percentage.
pub const HUMIDITY_MIN: f64 = 0.0;
/// Highest plausible relative humidity percentage.
pub const HUMIDITY_MAX: f64 = 100.0;

/// A single sensor observation as written by the device.
///
/// Field names match the firmware's wire format. `timestamp` is the raw,
/// unvalidated value - run it through [`normalize`](crate::normalize) before
/// treating it as wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage.
    pub humidity: f64,
    /// Raw timestamp as transmitted; encoding varies (see the normalizer).
    pub timestamp: i64,
    /// Monotonic counter assigned by the device. Display only; never used
    /// for ordering or identity.
    #[serde(default)]
    pub reading_number: u64,
    /// Battery level percentage, when the device reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<f64>,
    /// WiFi signal strength in dBm, when the device reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<f64>,
}

impl Reading {
    /// Whether the physical measurements fall inside the plausible sensor
    /// range (temperature -40..=80 C, humidity 0..=100 %).
    #[must_use]
    pub fn is_plausible(&self) -> bool {
        (TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&self.temperature)
            && (HUMIDITY_MIN..=HUMIDITY_MAX).contains(&self.humidity)
    }

    /// Normalize the raw timestamp.
    #[must_use]
    pub fn normalized_timestamp(&self) -> NormalizedTimestamp {
        normalize(self.timestamp as f64)
    }
}

/// A [`Reading`] enriched with the server-side timestamp verdict.
///
/// This is what the query engine and dashboard endpoints emit: the raw
/// fields pass through untouched, and the normalizer's output is attached
/// as first-class fields instead of a debug log line. A reading with
/// `valid: false` is surfaced, never hidden and never "fixed".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedReading {
    /// Store key of the history entry; absent for current snapshots.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub reading: Reading,
    /// Canonical UTC rendering, or an explicit marker when no canonical
    /// timestamp is derivable.
    #[serde(rename = "formattedTime")]
    pub formatted_time: String,
    /// Canonical epoch milliseconds, when derivable.
    #[serde(rename = "canonicalMs", skip_serializing_if = "Option::is_none")]
    pub canonical_ms: Option<i64>,
    /// Timestamp encoding classification.
    pub classification: TimestampClass,
    /// False when the timestamp could not be trusted as recent wall-clock.
    pub valid: bool,
    /// True when the physical values fall outside the plausible range.
    pub suspect: bool,
}

impl AnnotatedReading {
    /// Annotate a reading with its normalized timestamp.
    #[must_use]
    pub fn new(id: Option<String>, reading: Reading) -> Self {
        let ts = reading.normalized_timestamp();
        let formatted_time = ts
            .formatted()
            .unwrap_or_else(|| format!("not wall-clock ({})", ts.classification));
        let suspect = !reading.is_plausible();
        Self {
            id,
            reading,
            formatted_time,
            canonical_ms: ts.canonical_ms,
            classification: ts.classification,
            valid: ts.valid,
            suspect,
        }
    }
}
