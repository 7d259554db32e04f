//! # Domo HAL Library
//!
//! Hardware controller with pluggable GPIO backends.
//!
//! This crate provides the hardware-facing half of the domo node: the
//! backends that touch physical lines, the bounded-retry climate acquirer,
//! and the controller that serializes all bus access behind one lock.
//! Backends implement the `GpioBackend` trait defined in
//! `domo_common::io::backend`.
//!
//! # Module Structure
//!
//! - [`acquirer`] - Bounded-retry climate sensor acquisition
//! - [`backend_registry`] - Backend factory registration
//! - [`backends`] - GPIO backend implementations
//! - [`controller`] - The mutex-guarded hardware controller
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                        domo_hal                                │
//! │  ┌─────────────┐     ┌──────────────┐    ┌──────────────────┐  │
//! │  │  Gateway /  │────►│  Controller  │───►│ Backend Registry │  │
//! │  │  CLI caller │     │  (bus lock)  │    │                  │  │
//! │  └─────────────┘     └──────┬───────┘    └──────────────────┘  │
//! │                             │                                  │
//! │                   ┌─────────┴────────┐                         │
//! │                   ▼                  ▼                         │
//! │            ┌────────────┐    ┌──────────────┐                  │
//! │            │  Acquirer  │    │  GpioBackend │ (trait object)   │
//! │            │  (retries) │───►│  gpiochip/sim│                  │
//! │            └────────────┘    └──────────────┘                  │
//! └────────────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod acquirer;
pub mod backend_registry;
pub mod backends;
pub mod controller;

// Re-export key types for convenience
pub use crate::acquirer::ClimateAcquirer;
pub use crate::backend_registry::BackendRegistry;
pub use crate::controller::Controller;
