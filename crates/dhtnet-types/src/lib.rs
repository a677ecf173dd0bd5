//! Platform-agnostic types for DHT sensor network data.
//!
//! This crate defines the wire-level data model shared by the store adapter,
//! the query engine, and the HTTP service:
//!
//! - [`Reading`] / [`AnnotatedReading`] - a single temperature/humidity
//!   observation, raw and enriched forms
//! - [`Statistics`] - per-sensor running aggregates maintained by the device
//! - [`Device`] - an actuator associated with a sensor
//! - [`normalize`] - the timestamp normalizer that classifies the three
//!   timestamp encodings field devices are known to emit
//!
//! Field names follow the device firmware's snake_case wire format exactly;
//! enriched fields added server-side use the camelCase names the dashboard
//! consumes (`formattedTime`, `canonicalMs`).

mod device;
mod reading;
mod stats;
mod timestamp;

pub use device::{Device, DeviceKind, DeviceStatus};
pub use reading::{
    AnnotatedReading, HUMIDITY_MAX, HUMIDITY_MIN, Reading, TEMPERATURE_MAX, TEMPERATURE_MIN,
};
pub use stats::Statistics;
pub use timestamp::{
    MAX_VALID_YEAR, MIN_VALID_YEAR, NormalizedTimestamp, TimestampClass, format_utc_ms, normalize,
};
