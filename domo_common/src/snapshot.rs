//! Status snapshot and sensor reading types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A validated temperature/humidity reading.
///
/// Produced fresh by each acquisition; never cached between requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// When the reading was taken.
    pub valid_at: DateTime<Utc>,
}

/// Atomically assembled view of all line and sensor state.
///
/// Every field is read under one bus-lock acquisition, so a client never
/// observes digital states from different instants, or a digital state
/// paired with a stale partial sensor read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Pushbutton level.
    pub button: bool,
    /// PIR motion sensor level.
    pub motion_sensor: bool,
    /// Temperature in °C, `null` when the sensor was unavailable.
    pub temperature: Option<f64>,
    /// Relative humidity in %, `null` when the sensor was unavailable.
    pub humidity: Option<f64>,
    /// Whether the climate acquisition succeeded for this snapshot.
    pub sensor_ok: bool,
    /// Red LED state (last committed write).
    pub led_red: bool,
    /// Yellow LED state (last committed write).
    pub led_yellow: bool,
    /// Green LED state (last committed write).
    pub led_green: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_wire_field_names() {
        let snapshot = StatusSnapshot {
            button: true,
            motion_sensor: false,
            temperature: Some(21.5),
            humidity: Some(48.0),
            sensor_ok: true,
            led_red: true,
            led_yellow: false,
            led_green: false,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        for expected in [
            "button",
            "motionSensor",
            "temperature",
            "humidity",
            "sensorOk",
            "ledRed",
            "ledYellow",
            "ledGreen",
        ] {
            assert!(keys.contains(&expected), "missing {expected}");
        }
        assert_eq!(value["ledRed"], true);
        assert_eq!(value["motionSensor"], false);
    }

    #[test]
    fn sensor_unavailable_serializes_nulls() {
        let snapshot = StatusSnapshot {
            button: false,
            motion_sensor: false,
            temperature: None,
            humidity: None,
            sensor_ok: false,
            led_red: false,
            led_yellow: false,
            led_green: false,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value["temperature"].is_null());
        assert!(value["humidity"].is_null());
        assert_eq!(value["sensorOk"], false);
    }
}
