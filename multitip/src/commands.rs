//! Command flows behind the `multitip` binary.
//!
//! A [`Session`] ties a loaded configuration to the rack state file it
//! reads and writes. Commands that take tips save the rack back, even when
//! they fail partway.

use crate::allocator::{RackError, RackSnapshot, TipRackAllocator};
use crate::driver_registry::DriverRegistry;
use crate::drivers::simulation::{PipetteAction, SimulatedPipette};
use crate::persistence::{PersistenceError, RackStatePersistence};
use crate::wrapper::{PipetteWrapper, WrapperError};
use multitip_common::config::MultitipConfig;
use multitip_common::pipette::driver::DriverError;
use multitip_common::pipette::labware::{Labware, WellLocation};
use multitip_common::rack::RackDimensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Error types for CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Rack could not be built or allocated from
    #[error(transparent)]
    Rack(#[from] RackError),

    /// Driver could not be built or failed
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Wrapped pipette call failed
    #[error(transparent)]
    Wrapper(#[from] WrapperError),

    /// State file could not be read or written
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// What `demo` did.
#[derive(Debug, Clone)]
pub struct DemoReport {
    /// Actions performed by the simulated head, in order.
    pub actions: Vec<PipetteAction>,
    /// Rack after the run.
    pub rack: RackSnapshot,
}

/// Configuration plus the rack state file it resolves to.
pub struct Session {
    config: MultitipConfig,
    persistence: Option<RackStatePersistence>,
}

impl Session {
    /// Build a session.
    ///
    /// `state` overrides `pipette.state_file`; a relative `state_file` is
    /// taken relative to `config_dir`. Without either, every command starts
    /// from a fresh rack and nothing is saved.
    pub fn new(config: MultitipConfig, config_dir: &Path, state: Option<PathBuf>) -> Self {
        let persistence = state
            .or_else(|| config.state_file_in(config_dir))
            .map(RackStatePersistence::new);
        Self {
            config,
            persistence,
        }
    }

    /// Loaded configuration.
    pub fn config(&self) -> &MultitipConfig {
        &self.config
    }

    /// State file in use, if any.
    pub fn state_file(&self) -> Option<&Path> {
        self.persistence.as_ref().map(RackStatePersistence::path)
    }

    /// Size of the configured tip rack.
    pub fn tip_rack_dimensions(&self) -> RackDimensions {
        self.config
            .pipette
            .tip_racks
            .first()
            .map(|rack| rack.dimensions)
            .unwrap_or_default()
    }

    /// Reserve `num_tips` tips on the configured driver and save the rack.
    pub fn allocate(
        &self,
        registry: &DriverRegistry,
        num_tips: usize,
    ) -> Result<WellLocation, CommandError> {
        let rack = self.load_rack()?;
        let driver = registry.create_driver(&self.config.pipette.driver, &self.config.pipette)?;
        let mut wrapper = PipetteWrapper::with_rack(driver, rack)?;

        let location = wrapper.next_tip(Some(num_tips))?;

        let (_, rack) = wrapper.into_parts();
        self.save_rack(&rack)?;
        Ok(location)
    }

    /// Current rack state.
    pub fn snapshot(&self) -> Result<RackSnapshot, CommandError> {
        Ok(self.load_rack()?.snapshot())
    }

    /// Pick up, aspirate, dispense and drop once per entry of `tips` on the
    /// simulated pipette, then save the rack.
    pub fn demo(&self, tips: &[usize]) -> Result<DemoReport, CommandError> {
        let rack = self.load_rack()?;
        let pipette = SimulatedPipette::from_config(&self.config.pipette)?;
        let mut wrapper = PipetteWrapper::with_rack(pipette, rack)?
            .with_default_num_tips(usize::from(self.config.pipette.default_num_tips));

        let outcome = run_demo(&mut wrapper, tips);

        // Tips taken before a failure stay consumed on disk too.
        let (pipette, rack) = wrapper.into_parts();
        self.save_rack(&rack)?;
        outcome?;
        Ok(DemoReport {
            actions: pipette.history().to_vec(),
            rack: rack.snapshot(),
        })
    }

    fn load_rack(&self) -> Result<TipRackAllocator, CommandError> {
        let dimensions = self.tip_rack_dimensions();
        match &self.persistence {
            Some(persistence) => Ok(persistence.load_or_new(dimensions)?),
            None => Ok(TipRackAllocator::new(dimensions)?),
        }
    }

    fn save_rack(&self, rack: &TipRackAllocator) -> Result<(), CommandError> {
        match &self.persistence {
            Some(persistence) => persistence.save(rack)?,
            None => debug!("No state file configured, rack state not saved"),
        }
        Ok(())
    }
}

fn run_demo(
    wrapper: &mut PipetteWrapper<SimulatedPipette>,
    tips: &[usize],
) -> Result<(), CommandError> {
    let plate = Labware::new("96-flat", 2);
    let source = plate.well("A1")?;
    wrapper.home()?;
    for (idx, &n) in tips.iter().enumerate() {
        let destination = plate.well(&format!("A{}", idx % 11 + 2))?;

        wrapper.pick_up_tip(Some(n))?;
        wrapper.aspirate(10.0, &source)?;
        wrapper.dispense(10.0, &destination)?;
        wrapper.drop_tip()?;
    }
    Ok(())
}
