//! Device names, line directions and actuator actions.
//!
//! `Device` is the fixed table of logical names clients may address. The
//! climate sensor is not a `Device` — it is configured separately and never
//! resolvable by name.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::HwError;

// ─── Device ─────────────────────────────────────────────────────────

/// Logical device name bound to one digital line.
///
/// The wire names (`button`, `motionSensor`, `ledRed`, ...) are the exact
/// strings accepted in request paths and in the `lines` config table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Device {
    /// Momentary pushbutton (input).
    Button,
    /// PIR motion sensor (input).
    MotionSensor,
    /// Red indicator LED (output).
    LedRed,
    /// Yellow indicator LED (output).
    LedYellow,
    /// Green indicator LED (output).
    LedGreen,
}

impl Device {
    /// Every device in the fixed table.
    pub const ALL: [Device; 5] = [
        Device::Button,
        Device::MotionSensor,
        Device::LedRed,
        Device::LedYellow,
        Device::LedGreen,
    ];

    /// The three actuator lines.
    pub const ACTUATORS: [Device; 3] = [Device::LedRed, Device::LedYellow, Device::LedGreen];

    /// The two sensor input lines.
    pub const INPUTS: [Device; 2] = [Device::Button, Device::MotionSensor];

    /// Fixed direction of the line this device is bound to.
    pub fn direction(self) -> LineDirection {
        match self {
            Device::Button | Device::MotionSensor => LineDirection::Input,
            Device::LedRed | Device::LedYellow | Device::LedGreen => LineDirection::Output,
        }
    }

    /// Whether this device may be targeted by an actuator command.
    pub fn is_actuator(self) -> bool {
        self.direction() == LineDirection::Output
    }

    /// The wire name used in request paths and config.
    pub fn wire_name(self) -> &'static str {
        match self {
            Device::Button => "button",
            Device::MotionSensor => "motionSensor",
            Device::LedRed => "ledRed",
            Device::LedYellow => "ledYellow",
            Device::LedGreen => "ledGreen",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Device {
    type Err = HwError;

    /// Fails closed: anything outside the fixed table is `UnknownDevice`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "button" => Ok(Device::Button),
            "motionSensor" => Ok(Device::MotionSensor),
            "ledRed" => Ok(Device::LedRed),
            "ledYellow" => Ok(Device::LedYellow),
            "ledGreen" => Ok(Device::LedGreen),
            other => Err(HwError::UnknownDevice(other.to_string())),
        }
    }
}

// ─── LineDirection ──────────────────────────────────────────────────

/// Direction of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineDirection {
    /// Line is read by the controller.
    Input,
    /// Line is driven by the controller.
    Output,
}

impl fmt::Display for LineDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

// ─── Action ─────────────────────────────────────────────────────────

/// Actuator command parsed from the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drive the line high.
    On,
    /// Drive the line low.
    Off,
}

impl Action {
    /// The digital level this action applies.
    pub fn is_on(self) -> bool {
        matches!(self, Action::On)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

impl FromStr for Action {
    type Err = HwError;

    /// Anything outside `on` / `off` is rejected before reaching the
    /// controller.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Action::On),
            "off" => Ok(Action::Off),
            other => Err(HwError::InvalidAction(other.to_string())),
        }
    }
}
