//! Actuator types.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Kind of actuator a sensor can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DeviceKind {
    Relay,
    Led,
    Fan,
    Heater,
    Pump,
    Motor,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Relay => write!(f, "relay"),
            DeviceKind::Led => write!(f, "led"),
            DeviceKind::Fan => write!(f, "fan"),
            DeviceKind::Heater => write!(f, "heater"),
            DeviceKind::Pump => write!(f, "pump"),
            DeviceKind::Motor => write!(f, "motor"),
        }
    }
}

/// On/off state of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    On,
    Off,
}

impl DeviceStatus {
    /// Whether the actuator is drawing power.
    #[must_use]
    pub fn is_on(&self) -> bool {
        matches!(self, DeviceStatus::On)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::On => write!(f, "on"),
            DeviceStatus::Off => write!(f, "off"),
        }
    }
}

/// An actuator associated with exactly one sensor.
///
/// Device control is owned by an external service; this model is read-only
/// here and served verbatim from the store's optional `devices` tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub status: DeviceStatus,
    /// Power draw in watts, when metered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_consumption: Option<f64>,
    /// The sensor this actuator belongs to.
    pub sensor_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_wire_format() {
        let device: Device = serde_json::from_str(
            r#"{
                "id": "dev-1",
                "name": "Greenhouse fan",
                "type": "fan",
                "status": "on",
                "power_consumption": 18.5,
                "sensor_id": "sensor1"
            }"#,
        )
        .unwrap();
        assert_eq!(device.kind, DeviceKind::Fan);
        assert!(device.status.is_on());
        assert_eq!(device.power_consumption, Some(18.5));
    }

    #[test]
    fn status_round_trips_lowercase() {
        assert_eq!(serde_json::to_string(&DeviceStatus::Off).unwrap(), "\"off\"");
        assert_eq!(DeviceKind::Heater.to_string(), "heater");
    }
}
