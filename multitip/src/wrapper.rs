//! Pipette wrapper.
//!
//! `PipetteWrapper` drives an 8-channel pipette as if it had any number of
//! channels from 1 to 8. Every operation that picks up tips first takes a
//! block of the requested size from the [`TipRackAllocator`], resolves the
//! block's reference slot on the tip rack, and hands that location to the
//! driver for that one call. All other operations are forwarded unchanged.
//!
//! # Example
//!
//! ```rust
//! use multitip::drivers::simulation::SimulatedPipette;
//! use multitip::wrapper::PipetteWrapper;
//! use multitip_common::pipette::labware::Labware;
//!
//! let pipette = SimulatedPipette::new("p50_multi", 8, 50.0, vec![Labware::default()]);
//! let mut wrapper = PipetteWrapper::new(pipette).unwrap();
//!
//! let plate = Labware::new("96-flat", 2);
//! let source = plate.well("A1").unwrap();
//! let destinations = vec![plate.well("A2").unwrap(), plate.well("A3").unwrap()];
//! let tip = wrapper.distribute(10.0, source, destinations, Some(4)).unwrap();
//! assert_eq!(tip.well.to_string(), "E1");
//! ```

use crate::allocator::{RackError, RackSnapshot, TipRackAllocator};
use multitip_common::consts::{DEFAULT_NUM_TIPS, HEAD_CHANNELS};
use multitip_common::pipette::driver::{DriverError, PipetteDriver};
use multitip_common::pipette::labware::{Labware, LocationResolver, WellLocation};
use multitip_common::pipette::types::TransferPlan;
use thiserror::Error;
use tracing::{debug, info};

/// Error types for wrapper operations.
#[derive(Debug, Error)]
pub enum WrapperError {
    /// Allocation failed
    #[error(transparent)]
    Rack(#[from] RackError),

    /// Driver call failed
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// Wrapped pipette does not have 8 channels
    #[error("{name} is not an 8-channel pipette ({channels} channels)")]
    NotMultichannel {
        /// Pipette name.
        name: String,
        /// Channels it reports.
        channels: u8,
    },

    /// Wrapped pipette has no tip rack
    #[error("Pipette must be defined with a tip rack")]
    NoTipRack,

    /// Rack state was built for a different tip rack size
    #[error("Rack state does not match tip rack '{0}'")]
    RackMismatch(String),

    /// Operation deliberately not provided
    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
}

/// Facade over an 8-channel [`PipetteDriver`] that picks up 1..=8 tips.
pub struct PipetteWrapper<D: PipetteDriver> {
    driver: D,
    rack: TipRackAllocator,
    tip_rack: Labware,
    default_num_tips: usize,
}

impl<D: PipetteDriver> PipetteWrapper<D> {
    /// Wrap `driver`, tracking a fresh copy of its tip rack.
    ///
    /// # Errors
    /// - `WrapperError::NotMultichannel` unless the driver has 8 channels
    /// - `WrapperError::NoTipRack` if the driver has no tip rack
    /// - `WrapperError::Unsupported` if the driver has more than one tip rack
    pub fn new(driver: D) -> Result<Self, WrapperError> {
        let tip_rack = Self::single_tip_rack(&driver)?;
        let rack = TipRackAllocator::new(tip_rack.dimensions)?;
        Self::build(driver, tip_rack, rack)
    }

    /// Wrap `driver`, continuing from a previously used `rack`.
    ///
    /// # Errors
    /// As [`PipetteWrapper::new`], plus `WrapperError::RackMismatch` if
    /// `rack` has another size than the driver's tip rack.
    pub fn with_rack(driver: D, rack: TipRackAllocator) -> Result<Self, WrapperError> {
        let tip_rack = Self::single_tip_rack(&driver)?;
        if rack.dimensions() != tip_rack.dimensions {
            return Err(WrapperError::RackMismatch(tip_rack.name));
        }
        Self::build(driver, tip_rack, rack)
    }

    /// Tips taken when a call passes `None`.
    pub fn with_default_num_tips(mut self, num_tips: usize) -> Self {
        self.default_num_tips = num_tips;
        self
    }

    fn single_tip_rack(driver: &D) -> Result<Labware, WrapperError> {
        if driver.channels() != HEAD_CHANNELS {
            return Err(WrapperError::NotMultichannel {
                name: driver.name().to_string(),
                channels: driver.channels(),
            });
        }
        match driver.tip_racks() {
            [] => Err(WrapperError::NoTipRack),
            [tip_rack] => Ok(tip_rack.clone()),
            _ => Err(WrapperError::Unsupported("more than one tip rack")),
        }
    }

    fn build(driver: D, tip_rack: Labware, rack: TipRackAllocator) -> Result<Self, WrapperError> {
        info!(
            "Wrapping {} with tip rack '{}' on {} ({} tips left)",
            driver.name(),
            tip_rack.name,
            tip_rack.deck_slot,
            rack.available()
        );
        Ok(Self {
            driver,
            rack,
            tip_rack,
            default_num_tips: DEFAULT_NUM_TIPS as usize,
        })
    }

    /// Wrapped driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Tip rack state.
    pub fn rack(&self) -> &TipRackAllocator {
        &self.rack
    }

    /// Copy of the tip rack state.
    pub fn snapshot(&self) -> RackSnapshot {
        self.rack.snapshot()
    }

    /// Unwrap into the driver and the rack state.
    pub fn into_parts(self) -> (D, TipRackAllocator) {
        (self.driver, self.rack)
    }

    /// Take a block of `num_tips` (default when `None`) and resolve where
    /// the head must go to pick it up.
    ///
    /// The slots are consumed even if the location is never used.
    pub fn next_tip(&mut self, num_tips: Option<usize>) -> Result<WellLocation, WrapperError> {
        let n = num_tips.unwrap_or(self.default_num_tips);
        let slot = self.rack.allocate(n)?;
        let location = self.tip_rack.resolve(slot)?;
        info!("Taking {} tips at {}", n, location);
        Ok(location)
    }

    // ─── Tip acquisition ────────────────────────────────────────────

    /// Pick up `num_tips` tips (default when `None`).
    ///
    /// Returns the location the head was sent to.
    pub fn pick_up_tip(&mut self, num_tips: Option<usize>) -> Result<WellLocation, WrapperError> {
        self.ensure_no_tip()?;
        let location = self.next_tip(num_tips)?;
        self.driver.pick_up_tip(&location)?;
        Ok(location)
    }

    /// Run `plan` with `num_tips` tips (default when `None`).
    ///
    /// The plan is checked before any tip is taken.
    pub fn transfer(
        &mut self,
        plan: &TransferPlan,
        num_tips: Option<usize>,
    ) -> Result<WellLocation, WrapperError> {
        plan.validate()?;
        self.ensure_no_tip()?;
        let location = self.next_tip(num_tips)?;
        self.driver.transfer(plan, &location)?;
        Ok(location)
    }

    /// Split `volume_ul` from `source` into every destination.
    pub fn distribute(
        &mut self,
        volume_ul: f64,
        source: WellLocation,
        destinations: Vec<WellLocation>,
        num_tips: Option<usize>,
    ) -> Result<WellLocation, WrapperError> {
        self.transfer(&TransferPlan::distribute(volume_ul, source, destinations), num_tips)
    }

    /// Pool `volume_ul` from every source into `destination`.
    pub fn consolidate(
        &mut self,
        volume_ul: f64,
        sources: Vec<WellLocation>,
        destination: WellLocation,
        num_tips: Option<usize>,
    ) -> Result<WellLocation, WrapperError> {
        self.transfer(&TransferPlan::consolidate(volume_ul, sources, destination), num_tips)
    }

    /// Always fails: used tips are never given back to the rack.
    pub fn return_tip(&mut self) -> Result<(), WrapperError> {
        debug!("Rejected return_tip on {}", self.driver.name());
        Err(WrapperError::Unsupported("returning tips"))
    }

    fn ensure_no_tip(&self) -> Result<(), WrapperError> {
        if self.driver.has_tip() {
            return Err(DriverError::TipAlreadyAttached.into());
        }
        Ok(())
    }

    // ─── Forwarded operations ───────────────────────────────────────

    /// Instrument name.
    pub fn name(&self) -> &str {
        self.driver.name()
    }

    /// Head channel count.
    pub fn channels(&self) -> u8 {
        self.driver.channels()
    }

    /// True while tips are attached.
    pub fn has_tip(&self) -> bool {
        self.driver.has_tip()
    }

    /// Forwarded to [`PipetteDriver::drop_tip`].
    pub fn drop_tip(&mut self) -> Result<(), DriverError> {
        self.driver.drop_tip()
    }

    /// Forwarded to [`PipetteDriver::aspirate`].
    pub fn aspirate(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError> {
        self.driver.aspirate(volume_ul, location)
    }

    /// Forwarded to [`PipetteDriver::dispense`].
    pub fn dispense(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError> {
        self.driver.dispense(volume_ul, location)
    }

    /// Forwarded to [`PipetteDriver::mix`].
    pub fn mix(
        &mut self,
        repetitions: u32,
        volume_ul: f64,
        location: &WellLocation,
    ) -> Result<(), DriverError> {
        self.driver.mix(repetitions, volume_ul, location)
    }

    /// Forwarded to [`PipetteDriver::blow_out`].
    pub fn blow_out(&mut self, location: Option<&WellLocation>) -> Result<(), DriverError> {
        self.driver.blow_out(location)
    }

    /// Forwarded to [`PipetteDriver::home`].
    pub fn home(&mut self) -> Result<(), DriverError> {
        self.driver.home()
    }
}
