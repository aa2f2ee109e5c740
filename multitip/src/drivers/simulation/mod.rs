//! Simulation driver module.
//!
//! Software model of a multichannel pipette for development and testing
//! without an instrument attached.

mod driver;

pub use driver::{PipetteAction, SimulatedPipette};

use multitip_common::config::PipetteConfig;
use multitip_common::pipette::driver::{DriverError, PipetteDriver};

/// Factory function to create a simulation driver instance.
pub fn create_driver(config: &PipetteConfig) -> Result<Box<dyn PipetteDriver>, DriverError> {
    Ok(Box::new(SimulatedPipette::from_config(config)?))
}
