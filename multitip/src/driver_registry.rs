//! Driver registry for pipette drivers.
//!
//! Provides a `DriverRegistry` struct for registering and retrieving driver
//! factories by name. The registry is built by the caller and passed where
//! it is needed; there is no global state.

use multitip_common::config::PipetteConfig;
use multitip_common::pipette::driver::{DriverError, DriverFactory, PipetteDriver};
use std::collections::HashMap;
use tracing::info;

/// Registry of available pipette drivers.
pub struct DriverRegistry {
    factories: HashMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        if self.factories.contains_key(name) {
            panic!("Driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<DriverFactory> {
        self.factories.get(name).copied()
    }

    /// Create a driver instance by name.
    ///
    /// # Errors
    /// Returns `DriverError::DriverNotFound` if no driver with the given name
    /// is registered, or whatever the factory reports.
    pub fn create_driver(
        &self,
        name: &str,
        config: &PipetteConfig,
    ) -> Result<Box<dyn PipetteDriver>, DriverError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| DriverError::DriverNotFound(name.to_string()))?;
        let driver = factory(config)?;
        info!("Created driver '{}' for {}", name, driver.name());
        Ok(driver)
    }

    /// List all registered driver names.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::SimulatedPipette;

    fn create_test_driver(config: &PipetteConfig) -> Result<Box<dyn PipetteDriver>, DriverError> {
        Ok(Box::new(SimulatedPipette::new(
            "test",
            config.channels,
            config.max_volume_ul,
            Vec::new(),
        )))
    }

    fn create_failing_driver(_config: &PipetteConfig) -> Result<Box<dyn PipetteDriver>, DriverError> {
        Err(DriverError::InitFailed("no instrument".to_string()))
    }

    #[test]
    fn registry_register_and_create() {
        let mut reg = DriverRegistry::new();
        reg.register("test_driver", create_test_driver);

        let driver = reg
            .create_driver("test_driver", &PipetteConfig::default())
            .expect("should create");
        assert_eq!(driver.name(), "test");
        assert_eq!(driver.channels(), 8);
    }

    #[test]
    fn registry_driver_not_found() {
        let reg = DriverRegistry::new();
        let result = reg.create_driver("nonexistent", &PipetteConfig::default());
        assert!(matches!(result, Err(DriverError::DriverNotFound(_))));
    }

    #[test]
    fn registry_factory_error_propagates() {
        let mut reg = DriverRegistry::new();
        reg.register("broken", create_failing_driver);
        let result = reg.create_driver("broken", &PipetteConfig::default());
        assert!(matches!(result, Err(DriverError::InitFailed(_))));
    }

    #[test]
    fn registry_list_drivers() {
        let mut reg = DriverRegistry::new();
        reg.register("alpha", create_test_driver);
        reg.register("beta", create_test_driver);

        let mut names = reg.list_drivers();
        names.sort();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn builtin_registry_has_simulation() {
        let reg = crate::drivers::builtin_registry();
        assert!(reg.get_factory("simulation").is_some());
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_panics() {
        let mut reg = DriverRegistry::new();
        reg.register("dup", create_test_driver);
        reg.register("dup", create_test_driver);
    }
}
