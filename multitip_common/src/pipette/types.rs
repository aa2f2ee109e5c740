//! Liquid-handling request types shared by drivers and the wrapper.

use crate::pipette::driver::DriverError;
use crate::pipette::labware::WellLocation;
use serde::{Deserialize, Serialize};

/// Shape of a multi-well liquid movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    /// One source to one destination, pairwise.
    Transfer,
    /// One source split over many destinations.
    Distribute,
    /// Many sources pooled into one destination.
    Consolidate,
}

/// A liquid movement performed with a single tip pick-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    /// Movement shape.
    pub kind: TransferKind,
    /// Volume per destination (distribute, transfer) or per source (consolidate), in µL.
    pub volume_ul: f64,
    /// Wells to aspirate from.
    pub sources: Vec<WellLocation>,
    /// Wells to dispense into.
    pub destinations: Vec<WellLocation>,
}

impl TransferPlan {
    /// Pairwise transfer from `sources[i]` to `destinations[i]`.
    pub fn transfer(
        volume_ul: f64,
        sources: Vec<WellLocation>,
        destinations: Vec<WellLocation>,
    ) -> Self {
        Self {
            kind: TransferKind::Transfer,
            volume_ul,
            sources,
            destinations,
        }
    }

    /// Split `volume_ul` into every destination from one source.
    pub fn distribute(volume_ul: f64, source: WellLocation, destinations: Vec<WellLocation>) -> Self {
        Self {
            kind: TransferKind::Distribute,
            volume_ul,
            sources: vec![source],
            destinations,
        }
    }

    /// Pool `volume_ul` from every source into one destination.
    pub fn consolidate(volume_ul: f64, sources: Vec<WellLocation>, destination: WellLocation) -> Self {
        Self {
            kind: TransferKind::Consolidate,
            volume_ul,
            sources,
            destinations: vec![destination],
        }
    }

    /// Check well counts and volume for the plan's kind.
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.volume_ul.is_nan() || self.volume_ul <= 0.0 {
            return Err(DriverError::VolumeOutOfRange(self.volume_ul));
        }
        let ok = match self.kind {
            TransferKind::Transfer => {
                !self.sources.is_empty() && self.sources.len() == self.destinations.len()
            }
            TransferKind::Distribute => self.sources.len() == 1 && !self.destinations.is_empty(),
            TransferKind::Consolidate => !self.sources.is_empty() && self.destinations.len() == 1,
        };
        if !ok {
            return Err(DriverError::InvalidLocation(format!(
                "{:?} with {} sources and {} destinations",
                self.kind,
                self.sources.len(),
                self.destinations.len()
            )));
        }
        Ok(())
    }

    /// Total volume moved by the plan, in µL.
    pub fn total_volume_ul(&self) -> f64 {
        match self.kind {
            TransferKind::Transfer | TransferKind::Distribute => {
                self.volume_ul * self.destinations.len() as f64
            }
            TransferKind::Consolidate => self.volume_ul * self.sources.len() as f64,
        }
    }
}
