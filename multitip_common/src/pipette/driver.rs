//! Pipette driver trait and error types.
//!
//! This module defines:
//! - `PipetteDriver` trait - Interface for pluggable instrument drivers
//! - `DriverError` enum - Error types for instrument operations
//! - `DriverFactory` type alias - Factory function type

use crate::config::PipetteConfig;
use crate::pipette::labware::{Labware, WellLocation};
use crate::pipette::types::{TransferKind, TransferPlan};
use thiserror::Error;

/// Error types for instrument operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DriverError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Location is not addressable
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Operation needs a tip but none is attached
    #[error("No tip attached")]
    NoTipAttached,

    /// Pick-up requested while tips are still attached
    #[error("Tip already attached")]
    TipAlreadyAttached,

    /// A nozzle landed on a position with no tip
    #[error("No tip at {0}")]
    EmptyWell(String),

    /// Volume is non-positive or beyond the channel capacity
    #[error("Volume out of range: {0} uL")]
    VolumeOutOfRange(f64),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Operation not implemented by this driver
    #[error("Unsupported operation: {0}")]
    Unsupported(&'static str),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn(&PipetteConfig) -> Result<Box<dyn PipetteDriver>, DriverError>;

/// Trait defining the interface for pipette instrument drivers.
///
/// Pick-up operations take their tip location as an argument; a driver
/// never chooses tips on its own.
pub trait PipetteDriver: Send {
    /// Instrument name (e.g. "p50_multi").
    fn name(&self) -> &str;

    /// Number of channels on the head.
    fn channels(&self) -> u8;

    /// Largest volume one channel can hold, in µL.
    fn max_volume_ul(&self) -> f64;

    /// Tip racks the instrument was configured with.
    fn tip_racks(&self) -> &[Labware];

    /// True while tips are attached.
    fn has_tip(&self) -> bool;

    /// Pick up tips with the head's first channel over `location`.
    fn pick_up_tip(&mut self, location: &WellLocation) -> Result<(), DriverError>;

    /// Eject attached tips into the trash.
    fn drop_tip(&mut self) -> Result<(), DriverError>;

    /// Put attached tips back where they came from.
    fn return_tip(&mut self) -> Result<(), DriverError>;

    /// Draw `volume_ul` into each attached tip.
    fn aspirate(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError>;

    /// Expel `volume_ul` from each attached tip.
    fn dispense(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError>;

    /// Expel any remaining liquid, at `location` or in place.
    fn blow_out(&mut self, location: Option<&WellLocation>) -> Result<(), DriverError>;

    /// Move the head to its home position.
    fn home(&mut self) -> Result<(), DriverError>;

    /// Aspirate and dispense `volume_ul` at `location`, `repetitions` times.
    fn mix(
        &mut self,
        repetitions: u32,
        volume_ul: f64,
        location: &WellLocation,
    ) -> Result<(), DriverError> {
        for _ in 0..repetitions {
            self.aspirate(volume_ul, location)?;
            self.dispense(volume_ul, location)?;
        }
        Ok(())
    }

    /// Run `plan` with tips picked up at `tip`, dropping them at the end.
    ///
    /// Distribute and consolidate runs are split into trips that fit
    /// `max_volume_ul`.
    fn transfer(&mut self, plan: &TransferPlan, tip: &WellLocation) -> Result<(), DriverError> {
        plan.validate()?;
        self.pick_up_tip(tip)?;

        let per_trip = ((self.max_volume_ul() / plan.volume_ul).floor() as usize).max(1);
        match plan.kind {
            TransferKind::Transfer => {
                for (source, destination) in plan.sources.iter().zip(&plan.destinations) {
                    self.aspirate(plan.volume_ul, source)?;
                    self.dispense(plan.volume_ul, destination)?;
                }
            }
            TransferKind::Distribute => {
                let source = &plan.sources[0];
                for trip in plan.destinations.chunks(per_trip) {
                    self.aspirate(plan.volume_ul * trip.len() as f64, source)?;
                    for destination in trip {
                        self.dispense(plan.volume_ul, destination)?;
                    }
                }
            }
            TransferKind::Consolidate => {
                let destination = &plan.destinations[0];
                for trip in plan.sources.chunks(per_trip) {
                    for source in trip {
                        self.aspirate(plan.volume_ul, source)?;
                    }
                    self.dispense(plan.volume_ul * trip.len() as f64, destination)?;
                }
            }
        }

        self.drop_tip()
    }
}

impl<D: PipetteDriver + ?Sized> PipetteDriver for Box<D> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn channels(&self) -> u8 {
        (**self).channels()
    }

    fn max_volume_ul(&self) -> f64 {
        (**self).max_volume_ul()
    }

    fn tip_racks(&self) -> &[Labware] {
        (**self).tip_racks()
    }

    fn has_tip(&self) -> bool {
        (**self).has_tip()
    }

    fn pick_up_tip(&mut self, location: &WellLocation) -> Result<(), DriverError> {
        (**self).pick_up_tip(location)
    }

    fn drop_tip(&mut self) -> Result<(), DriverError> {
        (**self).drop_tip()
    }

    fn return_tip(&mut self) -> Result<(), DriverError> {
        (**self).return_tip()
    }

    fn aspirate(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError> {
        (**self).aspirate(volume_ul, location)
    }

    fn dispense(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError> {
        (**self).dispense(volume_ul, location)
    }

    fn blow_out(&mut self, location: Option<&WellLocation>) -> Result<(), DriverError> {
        (**self).blow_out(location)
    }

    fn home(&mut self) -> Result<(), DriverError> {
        (**self).home()
    }

    fn mix(
        &mut self,
        repetitions: u32,
        volume_ul: f64,
        location: &WellLocation,
    ) -> Result<(), DriverError> {
        (**self).mix(repetitions, volume_ul, location)
    }

    fn transfer(&mut self, plan: &TransferPlan, tip: &WellLocation) -> Result<(), DriverError> {
        (**self).transfer(plan, tip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every primitive call as a short string.
    #[derive(Default)]
    struct RecordingDriver {
        racks: Vec<Labware>,
        tip: bool,
        calls: Vec<String>,
    }

    impl PipetteDriver for RecordingDriver {
        fn name(&self) -> &str {
            "recording"
        }

        fn channels(&self) -> u8 {
            8
        }

        fn max_volume_ul(&self) -> f64 {
            50.0
        }

        fn tip_racks(&self) -> &[Labware] {
            &self.racks
        }

        fn has_tip(&self) -> bool {
            self.tip
        }

        fn pick_up_tip(&mut self, location: &WellLocation) -> Result<(), DriverError> {
            self.tip = true;
            self.calls.push(format!("pick {}", location.well));
            Ok(())
        }

        fn drop_tip(&mut self) -> Result<(), DriverError> {
            self.tip = false;
            self.calls.push("drop".to_string());
            Ok(())
        }

        fn return_tip(&mut self) -> Result<(), DriverError> {
            Err(DriverError::Unsupported("return_tip"))
        }

        fn aspirate(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError> {
            self.calls.push(format!("asp {volume_ul} {}", location.well));
            Ok(())
        }

        fn dispense(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError> {
            self.calls.push(format!("disp {volume_ul} {}", location.well));
            Ok(())
        }

        fn blow_out(&mut self, _location: Option<&WellLocation>) -> Result<(), DriverError> {
            Ok(())
        }

        fn home(&mut self) -> Result<(), DriverError> {
            Ok(())
        }
    }

    #[test]
    fn test_driver_error_display() {
        let err = DriverError::InitFailed("test error".to_string());
        assert!(err.to_string().contains("test error"));
        assert_eq!(DriverError::NoTipAttached.to_string(), "No tip attached");
    }

    #[test]
    fn distribute_splits_into_trips() {
        let plate = Labware::new("96-flat", 2);
        let rack = Labware::default();
        let plan = TransferPlan::distribute(
            20.0,
            plate.well("A1").unwrap(),
            vec![
                plate.well("A2").unwrap(),
                plate.well("A3").unwrap(),
                plate.well("A4").unwrap(),
            ],
        );

        let mut driver = RecordingDriver::default();
        driver.transfer(&plan, &rack.well("H1").unwrap()).unwrap();

        assert_eq!(
            driver.calls,
            vec![
                "pick H1", "asp 40 A1", "disp 20 A2", "disp 20 A3", "asp 20 A1", "disp 20 A4",
                "drop",
            ]
        );
        assert!(!driver.has_tip());
    }

    #[test]
    fn consolidate_pools_into_destination() {
        let plate = Labware::new("96-flat", 2);
        let rack = Labware::default();
        let plan = TransferPlan::consolidate(
            10.0,
            vec![plate.well("A1").unwrap(), plate.well("B1").unwrap()],
            plate.well("H12").unwrap(),
        );

        let mut driver: Box<dyn PipetteDriver> = Box::new(RecordingDriver::default());
        driver.transfer(&plan, &rack.well("E1").unwrap()).unwrap();
        assert!(!driver.has_tip());
    }

    #[test]
    fn mix_repeats_aspirate_dispense() {
        let plate = Labware::new("96-flat", 2);
        let mut driver = RecordingDriver::default();
        driver.mix(2, 5.0, &plate.well("C3").unwrap()).unwrap();
        assert_eq!(
            driver.calls,
            vec!["asp 5 C3", "disp 5 C3", "asp 5 C3", "disp 5 C3"]
        );
    }

    #[test]
    fn invalid_plan_picks_up_nothing() {
        let plate = Labware::new("96-flat", 2);
        let rack = Labware::default();
        let plan = TransferPlan::transfer(-1.0, vec![plate.well("A1").unwrap()], vec![]);

        let mut driver = RecordingDriver::default();
        assert!(driver.transfer(&plan, &rack.well("H1").unwrap()).is_err());
        assert!(driver.calls.is_empty());
    }
}
