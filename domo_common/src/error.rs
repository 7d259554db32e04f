//! Error types shared across the workspace.
//!
//! `HwError` is the operational taxonomy surfaced by the hardware controller;
//! `ConfigError` covers startup-time configuration validation and never
//! occurs after initialization.

use std::path::PathBuf;
use thiserror::Error;

use crate::io::line::{Device, LineDirection};

/// Errors surfaced by hardware operations.
#[derive(Debug, Clone, Error)]
pub enum HwError {
    /// Device name not present in the line registry.
    #[error("unknown device: {0:?}")]
    UnknownDevice(String),

    /// Device resolved to a line that cannot be actuated.
    #[error("device '{0}' is not an actuator")]
    InvalidTarget(String),

    /// Read on an output line or write on an input line.
    #[error("direction mismatch on '{line}': line is {actual}, operation needs {expected}")]
    DirectionMismatch {
        /// The line the operation targeted.
        line: Device,
        /// The line's configured direction.
        actual: LineDirection,
        /// The direction the operation requires.
        expected: LineDirection,
    },

    /// The underlying line access failed. Fatal to the current operation.
    #[error("hardware fault on '{line}': {reason}")]
    HardwareFault {
        /// Line or bus identifier the fault occurred on.
        line: String,
        /// Underlying failure description.
        reason: String,
    },

    /// Every acquisition attempt within the retry bound failed.
    #[error("sensor acquisition failed after {attempts} attempts")]
    AcquisitionFailed {
        /// Number of attempts made before giving up.
        attempts: u32,
    },

    /// Action string outside the accepted `on` / `off` set.
    #[error("invalid action {0:?} (expected \"on\" or \"off\")")]
    InvalidAction(String),
}

/// Configuration validation errors. Startup only.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed as TOML.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A device appears more than once in the `lines` table.
    #[error("device '{0}' listed more than once")]
    DuplicateDevice(Device),

    /// Two devices share the same line offset.
    #[error("pin {pin} assigned to both '{first}' and '{second}'")]
    DuplicatePin {
        /// The contested line offset.
        pin: u32,
        /// Device that claimed the pin first.
        first: Device,
        /// Device that claimed it again.
        second: Device,
    },

    /// A device from the fixed table has no line definition.
    #[error("missing line definition for '{0}'")]
    MissingDevice(Device),

    /// The climate sensor pin collides with a digital line.
    #[error("sensor pin {pin} collides with digital line '{device}'")]
    SensorPinCollision {
        /// The contested line offset.
        pin: u32,
        /// The digital line already on that pin.
        device: Device,
    },

    /// No backend registered under the configured name.
    #[error("unknown backend {0:?}")]
    UnknownBackend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hw_error_display() {
        let err = HwError::UnknownDevice("ledBlue".to_string());
        assert!(err.to_string().contains("ledBlue"));

        let err = HwError::AcquisitionFailed { attempts: 15 };
        assert!(err.to_string().contains("15"));

        let err = HwError::DirectionMismatch {
            line: Device::Button,
            actual: LineDirection::Input,
            expected: LineDirection::Output,
        };
        let text = err.to_string();
        assert!(text.contains("button"));
        assert!(text.contains("input"));
        assert!(text.contains("output"));
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::DuplicatePin {
            pin: 13,
            first: Device::LedRed,
            second: Device::LedYellow,
        };
        let text = err.to_string();
        assert!(text.contains("13"));
        assert!(text.contains("ledRed"));
        assert!(text.contains("ledYellow"));
    }
}
