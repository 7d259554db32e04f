//! GPIO backend implementations.
//!
//! This module contains all hardware backend implementations:
//!
//! - [`gpiochip`] - Linux GPIO character device backend (the real hardware)
//! - [`sim`] - Software simulation backend for development and testing
//!
//! # Adding New Backends
//!
//! 1. Create a new submodule under `backends/`
//! 2. Implement the `GpioBackend` trait from `domo_common::io::backend`
//! 3. Register the backend in `register_all()`

pub mod gpiochip;
pub mod sim;

use crate::backend_registry::BackendRegistry;

/// Register all built-in backends.
///
/// Called once at startup before any backend is requested.
pub fn register_all(registry: &mut BackendRegistry) {
    registry.register("gpiochip", gpiochip::create_backend);
    registry.register("sim", sim::create_backend);
}
