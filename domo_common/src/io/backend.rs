//! Hardware backend trait and sampling error types.
//!
//! This module defines:
//! - `GpioBackend` trait - Interface for pluggable hardware backends
//! - `BackendFactory` type alias - Factory function type
//! - `ClimateSample` - One raw temperature/humidity pair
//! - `SampleError` - Per-attempt sensor failure

use thiserror::Error;

use crate::config::NodeConfig;
use crate::error::HwError;
use crate::io::line::LineDirection;
use crate::io::registry::{Line, LineRegistry};

/// One raw temperature/humidity pair as sampled off the bus.
///
/// Unvalidated: plausibility checking is the acquirer's job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    /// Temperature in °C.
    pub temperature: f64,
    /// Relative humidity in %.
    pub humidity: f64,
}

/// Failure of a single acquisition attempt.
///
/// These are expected, transient outcomes of the one-wire protocol; the
/// acquirer retries them up to its bound.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    /// Sensor did not produce the expected edge in time.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// Parity byte did not match the payload.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum {
        /// Checksum computed over the payload.
        expected: u8,
        /// Checksum byte the sensor sent.
        actual: u8,
    },

    /// Decoded pair outside the sensor's physical range.
    #[error("implausible reading: {temperature} °C / {humidity} %RH")]
    OutOfRange {
        /// Decoded temperature.
        temperature: f64,
        /// Decoded humidity.
        humidity: f64,
    },

    /// The bus itself failed (line request or ioctl error).
    #[error("sensor bus error: {0}")]
    Bus(String),
}

/// Factory function type for creating backend instances.
pub type BackendFactory = fn() -> Box<dyn GpioBackend>;

/// Interface for pluggable hardware backends.
///
/// The controller drives backends through this trait, enabling a real
/// Linux GPIO character-device backend and a software simulation to be
/// swapped at startup.
///
/// # Lifecycle
///
/// 1. `init()` - called once before any line access
/// 2. `read()` / `write()` / `sample_climate()` - serialized by the
///    controller's bus lock; implementations may assume no concurrent calls
/// 3. `shutdown()` - called when the controller is stopping
pub trait GpioBackend: Send {
    /// The backend's unique identifier (e.g. `"gpiochip"`, `"sim"`).
    fn name(&self) -> &'static str;

    /// Claim every registered line plus the sensor pin.
    ///
    /// # Errors
    /// `HardwareFault` if a line cannot be claimed.
    fn init(&mut self, registry: &LineRegistry, config: &NodeConfig) -> Result<(), HwError>;

    /// Read the current level of an input line.
    ///
    /// # Errors
    /// `DirectionMismatch` on an output line, `HardwareFault` if the
    /// underlying access fails.
    fn read(&mut self, line: &Line) -> Result<bool, HwError>;

    /// Drive an output line. The physical level persists until the next
    /// write.
    ///
    /// # Errors
    /// `DirectionMismatch` on an input line, `HardwareFault` if the
    /// underlying access fails.
    fn write(&mut self, line: &Line, level: bool) -> Result<(), HwError>;

    /// Perform ONE acquisition attempt against the climate sensor.
    ///
    /// Retry policy lives in the acquirer, which wraps this with its
    /// bounded attempt sequence.
    fn sample_climate(&mut self) -> Result<ClimateSample, SampleError>;

    /// Release claimed lines. Output levels are not altered here; the
    /// controller drives them to the safe default first.
    fn shutdown(&mut self) -> Result<(), HwError>;
}

/// Reject an operation against a line of the wrong direction.
pub fn ensure_direction(line: &Line, expected: LineDirection) -> Result<(), HwError> {
    if line.direction == expected {
        Ok(())
    } else {
        Err(HwError::DirectionMismatch {
            line: line.device,
            actual: line.direction,
            expected,
        })
    }
}
