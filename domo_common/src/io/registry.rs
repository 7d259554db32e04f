//! Line registry — name-to-line resolution.
//!
//! Built at startup from `NodeConfig`, validated once, immutable afterwards.
//! Every runtime lookup is an O(1) map access; resolution fails closed with
//! `UnknownDevice` instead of leaving anything unbound.

use std::collections::HashMap;

use crate::config::NodeConfig;
use crate::error::{ConfigError, HwError};
use crate::io::line::{Device, LineDirection};

/// A logical device bound to one physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Logical device name.
    pub device: Device,
    /// BCM line offset.
    pub pin: u32,
    /// Fixed direction, derived from the device.
    pub direction: LineDirection,
}

/// Immutable map from device names to lines.
///
/// Construction guarantees the map is total over [`Device::ALL`], pins are
/// unique, and the sensor pin is disjoint from every digital line.
#[derive(Debug, Clone)]
pub struct LineRegistry {
    lines: HashMap<Device, Line>,
}

impl LineRegistry {
    /// Build the registry from config, running all validation rules.
    ///
    /// Returns the first validation error encountered.
    pub fn from_config(config: &NodeConfig) -> Result<Self, ConfigError> {
        let mut lines: HashMap<Device, Line> = HashMap::new();
        let mut pin_owner: HashMap<u32, Device> = HashMap::new();

        for entry in &config.lines {
            if lines.contains_key(&entry.device) {
                return Err(ConfigError::DuplicateDevice(entry.device));
            }
            if let Some(&first) = pin_owner.get(&entry.pin) {
                return Err(ConfigError::DuplicatePin {
                    pin: entry.pin,
                    first,
                    second: entry.device,
                });
            }
            pin_owner.insert(entry.pin, entry.device);
            lines.insert(
                entry.device,
                Line {
                    device: entry.device,
                    pin: entry.pin,
                    direction: entry.device.direction(),
                },
            );
        }

        for device in Device::ALL {
            if !lines.contains_key(&device) {
                return Err(ConfigError::MissingDevice(device));
            }
        }

        if let Some(&device) = pin_owner.get(&config.sensor.pin) {
            return Err(ConfigError::SensorPinCollision {
                pin: config.sensor.pin,
                device,
            });
        }

        Ok(Self { lines })
    }

    /// Resolve a wire name to its line. Fails with `UnknownDevice`.
    pub fn resolve(&self, name: &str) -> Result<&Line, HwError> {
        let device: Device = name.parse()?;
        Ok(self.line(device))
    }

    /// Resolve a wire name to an actuator line.
    ///
    /// `UnknownDevice` for names outside the table, `InvalidTarget` for
    /// known non-output lines.
    pub fn resolve_actuator(&self, name: &str) -> Result<&Line, HwError> {
        let line = self.resolve(name)?;
        if line.direction != LineDirection::Output {
            return Err(HwError::InvalidTarget(name.to_string()));
        }
        Ok(line)
    }

    /// Look up a line by device. Total by construction.
    pub fn line(&self, device: Device) -> &Line {
        self.lines
            .get(&device)
            .expect("registry is total over the device table")
    }

    /// Iterate all lines.
    pub fn iter(&self) -> impl Iterator<Item = &Line> {
        self.lines.values()
    }
}
