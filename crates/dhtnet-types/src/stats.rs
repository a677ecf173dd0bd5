//! Per-sensor aggregate statistics maintained by the device firmware.

use serde::{Deserialize, Serialize};

/// Running aggregates for one sensor, as stored at `<sensorId>/statistics`.
///
/// The device maintains these itself; this core only reads and formats them.
/// Two different clocks are mixed here and must not be compared:
/// `last_update` is wall-clock (with the usual encoding ambiguity), while
/// `session_duration` is milliseconds of device uptime and resets to zero
/// on every reboot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub avg_temperature: f64,
    pub min_humidity: f64,
    pub max_humidity: f64,
    pub avg_humidity: f64,
    /// Monotonically non-decreasing reading count for the sensor lifetime.
    #[serde(default)]
    pub total_readings: u64,
    /// Device uptime in milliseconds, NOT wall-clock elapsed time.
    #[serde(default)]
    pub session_duration: i64,
    /// Raw timestamp of the last aggregate update; same multi-encoding
    /// ambiguity as `Reading::timestamp`.
    #[serde(default)]
    pub last_update: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_firmware_payload() {
        let stats: Statistics = serde_json::from_str(
            r#"{
                "min_temperature": 18.2,
                "max_temperature": 27.9,
                "avg_temperature": 22.4,
                "min_humidity": 31.0,
                "max_humidity": 64.5,
                "avg_humidity": 47.1,
                "total_readings": 1240,
                "session_duration": 3661000,
                "last_update": 1700000000
            }"#,
        )
        .unwrap();
        assert_eq!(stats.total_readings, 1240);
        assert_eq!(stats.session_duration, 3_661_000);
        assert_eq!(stats.last_update, 1_700_000_000);
    }

    #[test]
    fn counters_default_to_zero_when_absent() {
        let stats: Statistics = serde_json::from_str(
            r#"{
                "min_temperature": 0.0,
                "max_temperature": 0.0,
                "avg_temperature": 0.0,
                "min_humidity": 0.0,
                "max_humidity": 0.0,
                "avg_humidity": 0.0
            }"#,
        )
        .unwrap();
        assert_eq!(stats.total_readings, 0);
        assert_eq!(stats.last_update, 0);
    }
}
