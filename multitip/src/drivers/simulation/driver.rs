//! Simulated multichannel pipette.
//!
//! Models the head as a column of channels: channel 0 sits over the target
//! well and the others hang below it, one row apart. A pick-up attaches one
//! tip per channel that lands on a tip still in the rack.

use multitip_common::config::PipetteConfig;
use multitip_common::pipette::driver::{DriverError, PipetteDriver};
use multitip_common::pipette::labware::{Labware, WellLocation};
use multitip_common::rack::SlotId;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// One primitive performed by the simulated head.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PipetteAction {
    /// Tips attached with channel 0 over `location`.
    PickUpTip {
        /// Where channel 0 went down.
        location: WellLocation,
        /// Tips that actually attached.
        tips: u8,
    },
    /// Tips ejected.
    DropTip,
    /// Tips put back in the rack.
    ReturnTip,
    /// Liquid drawn.
    Aspirate {
        /// Volume per tip, µL.
        volume_ul: f64,
        /// Source well.
        location: WellLocation,
    },
    /// Liquid expelled.
    Dispense {
        /// Volume per tip, µL.
        volume_ul: f64,
        /// Destination well.
        location: WellLocation,
    },
    /// Remaining liquid expelled.
    BlowOut,
    /// Head homed.
    Home,
}

/// Tips currently on the head.
#[derive(Debug, Clone)]
struct AttachedTips {
    /// Wells the tips came from.
    wells: Vec<(String, SlotId)>,
    /// Liquid held per tip, µL.
    volume_ul: f64,
}

/// Simulation driver implementing the PipetteDriver trait.
pub struct SimulatedPipette {
    name: String,
    channels: u8,
    max_volume_ul: f64,
    tip_racks: Vec<Labware>,
    /// Rack wells whose tip has left the rack.
    picked: HashSet<(String, SlotId)>,
    attached: Option<AttachedTips>,
    history: Vec<PipetteAction>,
}

impl SimulatedPipette {
    /// Create a simulated pipette.
    pub fn new(
        name: impl Into<String>,
        channels: u8,
        max_volume_ul: f64,
        tip_racks: Vec<Labware>,
    ) -> Self {
        Self {
            name: name.into(),
            channels,
            max_volume_ul,
            tip_racks,
            picked: HashSet::new(),
            attached: None,
            history: Vec::new(),
        }
    }

    /// Create a simulated pipette from the `[pipette]` config section.
    ///
    /// # Errors
    /// Returns `DriverError::InitFailed` if a tip rack is invalid.
    pub fn from_config(config: &PipetteConfig) -> Result<Self, DriverError> {
        for rack in &config.tip_racks {
            rack.validate()
                .map_err(|e| DriverError::InitFailed(e.to_string()))?;
        }
        info!(
            "Simulated pipette '{}' with {} channels, {} tip racks",
            config.name,
            config.channels,
            config.tip_racks.len()
        );
        Ok(Self::new(
            config.name.clone(),
            config.channels,
            config.max_volume_ul,
            config.tip_racks.clone(),
        ))
    }

    /// Every primitive performed so far, oldest first.
    pub fn history(&self) -> &[PipetteAction] {
        &self.history
    }

    /// Number of tips on the head.
    pub fn attached_tips(&self) -> usize {
        self.attached.as_ref().map_or(0, |tips| tips.wells.len())
    }

    /// Liquid held per tip, µL.
    pub fn current_volume_ul(&self) -> f64 {
        self.attached.as_ref().map_or(0.0, |tips| tips.volume_ul)
    }

    /// True if the tip at `slot` of `rack` has left the rack.
    pub fn is_picked(&self, rack: &str, slot: SlotId) -> bool {
        self.picked.contains(&(rack.to_string(), slot))
    }

    fn attached_mut(&mut self) -> Result<&mut AttachedTips, DriverError> {
        self.attached.as_mut().ok_or(DriverError::NoTipAttached)
    }
}

impl PipetteDriver for SimulatedPipette {
    fn name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> u8 {
        self.channels
    }

    fn max_volume_ul(&self) -> f64 {
        self.max_volume_ul
    }

    fn tip_racks(&self) -> &[Labware] {
        &self.tip_racks
    }

    fn has_tip(&self) -> bool {
        self.attached.is_some()
    }

    fn pick_up_tip(&mut self, location: &WellLocation) -> Result<(), DriverError> {
        if self.attached.is_some() {
            return Err(DriverError::TipAlreadyAttached);
        }

        let rack = self
            .tip_racks
            .iter()
            .find(|rack| rack.name == location.labware && rack.deck_slot == location.deck_slot)
            .ok_or_else(|| {
                DriverError::InvalidLocation(format!("{} is not a tip rack", location.labware))
            })?;
        let rows = rack.dimensions.rows;

        let top = location.well;
        if !rack.dimensions.contains(top) {
            return Err(DriverError::InvalidLocation(location.to_string()));
        }
        if self.picked.contains(&(rack.name.clone(), top)) {
            return Err(DriverError::EmptyWell(location.to_string()));
        }

        // Channels below the last row miss the rack.
        let wells: Vec<(String, SlotId)> = (0..self.channels)
            .map(|channel| u16::from(top.row()) + u16::from(channel))
            .take_while(|&row| row < u16::from(rows))
            .filter_map(|row| SlotId::new(row as u8, top.column()))
            .map(|slot| (rack.name.clone(), slot))
            .filter(|key| !self.picked.contains(key))
            .collect();

        let tips = wells.len() as u8;
        self.picked.extend(wells.iter().cloned());
        self.attached = Some(AttachedTips {
            wells,
            volume_ul: 0.0,
        });

        info!("Picked up {} tips at {}", tips, location);
        self.history.push(PipetteAction::PickUpTip {
            location: location.clone(),
            tips,
        });
        Ok(())
    }

    fn drop_tip(&mut self) -> Result<(), DriverError> {
        let tips = self.attached.take().ok_or(DriverError::NoTipAttached)?;
        debug!("Dropped {} tips", tips.wells.len());
        self.history.push(PipetteAction::DropTip);
        Ok(())
    }

    fn return_tip(&mut self) -> Result<(), DriverError> {
        let tips = self.attached.take().ok_or(DriverError::NoTipAttached)?;
        for well in &tips.wells {
            self.picked.remove(well);
        }
        debug!("Returned {} tips", tips.wells.len());
        self.history.push(PipetteAction::ReturnTip);
        Ok(())
    }

    fn aspirate(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError> {
        let max = self.max_volume_ul;
        let tips = self.attached_mut()?;
        if volume_ul.is_nan() || volume_ul <= 0.0 || tips.volume_ul + volume_ul > max {
            return Err(DriverError::VolumeOutOfRange(volume_ul));
        }
        tips.volume_ul += volume_ul;

        debug!("Aspirated {} uL at {}", volume_ul, location);
        self.history.push(PipetteAction::Aspirate {
            volume_ul,
            location: location.clone(),
        });
        Ok(())
    }

    fn dispense(&mut self, volume_ul: f64, location: &WellLocation) -> Result<(), DriverError> {
        let tips = self.attached_mut()?;
        if volume_ul.is_nan() || volume_ul <= 0.0 || volume_ul > tips.volume_ul + 1e-9 {
            return Err(DriverError::VolumeOutOfRange(volume_ul));
        }
        tips.volume_ul = (tips.volume_ul - volume_ul).max(0.0);

        debug!("Dispensed {} uL at {}", volume_ul, location);
        self.history.push(PipetteAction::Dispense {
            volume_ul,
            location: location.clone(),
        });
        Ok(())
    }

    fn blow_out(&mut self, location: Option<&WellLocation>) -> Result<(), DriverError> {
        let tips = self.attached_mut()?;
        tips.volume_ul = 0.0;

        match location {
            Some(location) => debug!("Blew out at {}", location),
            None => debug!("Blew out in place"),
        }
        self.history.push(PipetteAction::BlowOut);
        Ok(())
    }

    fn home(&mut self) -> Result<(), DriverError> {
        debug!("Homing {}", self.name);
        self.history.push(PipetteAction::Home);
        Ok(())
    }
}
