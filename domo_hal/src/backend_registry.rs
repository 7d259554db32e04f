//! Registry of hardware backend factories.
//!
//! Constructed at startup, populated via `register()`, consumed when the
//! configured backend is instantiated. No global state — testable in
//! isolation.

use std::collections::HashMap;

use domo_common::error::ConfigError;
use domo_common::io::backend::{BackendFactory, GpioBackend};

/// Registry of available hardware backends.
pub struct BackendRegistry {
    factories: HashMap<&'static str, BackendFactory>,
}

impl BackendRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: BackendFactory) {
        if self.factories.contains_key(name) {
            panic!("Backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a backend factory by name.
    pub fn get_factory(&self, name: &str) -> Option<BackendFactory> {
        self.factories.get(name).copied()
    }

    /// Create a backend instance by name.
    ///
    /// # Errors
    /// Returns `ConfigError::UnknownBackend` if no backend with the given
    /// name is registered.
    pub fn create(&self, name: &str) -> Result<Box<dyn GpioBackend>, ConfigError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| ConfigError::UnknownBackend(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered backend names.
    pub fn list_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
