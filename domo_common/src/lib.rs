//! Domo Common Library
//!
//! Shared types for the domo workspace: the line/device model, the hardware
//! backend contract, configuration loading, and the status snapshot returned
//! to clients.
//!
//! # Module Structure
//!
//! - [`config`] - Node configuration (`domo.toml`) loading and defaults
//! - [`error`] - Operational and configuration error types
//! - [`io`] - Line model, line registry, and the `GpioBackend` trait
//! - [`snapshot`] - `StatusSnapshot` and `SensorReading`

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod io;
pub mod snapshot;
