//! Node configuration loading.
//!
//! Deserialized from `domo.toml` at startup. Every field has a default so an
//! absent file yields a working node: the stock BCM pin map with the
//! `gpiochip` backend on `/dev/gpiochip0`, listening on port 80.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::io::line::Device;

// ─── LineEntry ──────────────────────────────────────────────────────

/// One `lines` table entry binding a device to a BCM line offset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LineEntry {
    /// Logical device name.
    pub device: Device,
    /// BCM line offset on the GPIO chip.
    pub pin: u32,
}

// ─── SensorConfig ───────────────────────────────────────────────────

/// Climate sensor model. Decides how the 40 acquired bits are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// DHT11: integral-degree encoding, 0–50 °C / 20–90 %RH.
    Dht11,
    /// DHT22 (AM2302): tenth-degree encoding, signed temperature.
    Dht22,
}

impl Default for SensorKind {
    fn default() -> Self {
        Self::Dht11
    }
}

/// Climate sensor configuration (`[sensor]` table).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensorConfig {
    /// BCM line offset of the sensor's data line.
    #[serde(default = "default_sensor_pin")]
    pub pin: u32,

    /// Sensor model.
    #[serde(default)]
    pub kind: SensorKind,

    /// Acquisition attempts per request before giving up.
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Fixed delay between attempts [ms].
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl SensorConfig {
    /// Delay between acquisition attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            pin: default_sensor_pin(),
            kind: SensorKind::default(),
            attempts: default_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_sensor_pin() -> u32 {
    4
}

fn default_attempts() -> u32 {
    15
}

fn default_retry_delay_ms() -> u64 {
    2000
}

// ─── NodeConfig ─────────────────────────────────────────────────────

/// Top-level node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Gateway listen address.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Hardware backend name (`gpiochip` or `sim`).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// GPIO character device path.
    #[serde(default = "default_chip")]
    pub chip: String,

    /// Device-to-pin bindings. Must cover the fixed device table exactly.
    #[serde(default = "default_lines")]
    pub lines: Vec<LineEntry>,

    /// Climate sensor settings.
    #[serde(default)]
    pub sensor: SensorConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            backend: default_backend(),
            chip: default_chip(),
            lines: default_lines(),
            sensor: SensorConfig::default(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 80))
}

fn default_backend() -> String {
    "gpiochip".to_string()
}

fn default_chip() -> String {
    "/dev/gpiochip0".to_string()
}

/// Stock BCM pin map.
fn default_lines() -> Vec<LineEntry> {
    vec![
        LineEntry {
            device: Device::Button,
            pin: 20,
        },
        LineEntry {
            device: Device::MotionSensor,
            pin: 16,
        },
        LineEntry {
            device: Device::LedRed,
            pin: 13,
        },
        LineEntry {
            device: Device::LedYellow,
            pin: 23,
        },
        LineEntry {
            device: Device::LedGreen,
            pin: 24,
        },
    ]
}

impl NodeConfig {
    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a file, falling back to built-in defaults if it is absent.
    ///
    /// A present-but-invalid file is still an error; only a missing file is
    /// forgiven.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("no config at {}, using built-in defaults", path.display());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn defaults_match_stock_pin_map() {
        let config = NodeConfig::default();
        assert_eq!(config.listen.port(), 80);
        assert_eq!(config.backend, "gpiochip");
        assert_eq!(config.chip, "/dev/gpiochip0");
        assert_eq!(config.sensor.pin, 4);
        assert_eq!(config.sensor.kind, SensorKind::Dht11);
        assert_eq!(config.sensor.attempts, 15);
        assert_eq!(config.sensor.retry_delay(), Duration::from_secs(2));

        let pin_of = |device: Device| {
            config
                .lines
                .iter()
                .find(|e| e.device == device)
                .map(|e| e.pin)
        };
        assert_eq!(pin_of(Device::Button), Some(20));
        assert_eq!(pin_of(Device::MotionSensor), Some(16));
        assert_eq!(pin_of(Device::LedRed), Some(13));
        assert_eq!(pin_of(Device::LedYellow), Some(23));
        assert_eq!(pin_of(Device::LedGreen), Some(24));
    }

    #[test]
    fn empty_toml_is_the_default() {
        let config = NodeConfig::from_toml("").unwrap();
        assert_eq!(config.lines.len(), 5);
        assert_eq!(config.sensor.attempts, 15);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
listen = "127.0.0.1:8080"
backend = "sim"
chip = "/dev/gpiochip2"

lines = [
    { device = "button", pin = 5 },
    { device = "motionSensor", pin = 6 },
    { device = "ledRed", pin = 17 },
    { device = "ledYellow", pin = 27 },
    { device = "ledGreen", pin = 22 },
]

[sensor]
pin = 12
kind = "dht22"
attempts = 3
retry_delay_ms = 50
"#;
        let config = NodeConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.listen.port(), 8080);
        assert_eq!(config.backend, "sim");
        assert_eq!(config.chip, "/dev/gpiochip2");
        assert_eq!(config.lines.len(), 5);
        assert_eq!(config.sensor.kind, SensorKind::Dht22);
        assert_eq!(config.sensor.attempts, 3);
        assert_eq!(config.sensor.retry_delay(), Duration::from_millis(50));
    }

    #[test]
    fn unknown_device_name_rejected() {
        let toml_str = r#"
lines = [
    { device = "ledBlue", pin = 5 },
]
"#;
        assert!(NodeConfig::from_toml(toml_str).is_err());
    }

    #[test]
    fn load_or_default_missing_file() {
        let config = NodeConfig::load_or_default(Path::new("/nonexistent/domo.toml")).unwrap();
        assert_eq!(config.lines.len(), 5);
    }

    #[test]
    fn load_or_default_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "listen = 42").unwrap();
        let err = NodeConfig::load_or_default(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
