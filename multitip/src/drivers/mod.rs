//! Pipette driver implementations.
//!
//! - [`simulation`] - Software 8-channel pipette for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `PipetteDriver` trait from `multitip_common::pipette::driver`
//! 3. Register its factory in [`builtin_registry`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Registry holding every built-in driver.
pub fn builtin_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry.register("simulation", simulation::create_driver);
    registry
}
