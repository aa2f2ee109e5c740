//! Labware placed on the deck, and the physical locations of its wells.
//!
//! `Labware` is the [`LocationResolver`] for tip racks: it turns a rack
//! `SlotId` into a `WellLocation` the instrument driver can move to.

use crate::consts::{A1_X_MM, A1_Y_MM, DECK_SLOTS, WELL_PITCH_MM};
use crate::pipette::driver::DriverError;
use crate::rack::{RackDimensions, SlotId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maps a slot identifier to an addressable physical location.
pub trait LocationResolver {
    /// Resolve `slot` to a location usable by the instrument driver.
    ///
    /// # Errors
    /// Returns `DriverError::InvalidLocation` if `slot` is not part of this labware.
    fn resolve(&self, slot: SlotId) -> Result<WellLocation, DriverError>;
}

/// A well of a specific labware, with its centre offset from the labware origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellLocation {
    /// Labware name.
    pub labware: String,
    /// Deck position of the labware (1-12).
    pub deck_slot: u8,
    /// Well within the labware.
    pub well: SlotId,
    /// Well centre X offset in millimetres.
    pub x_mm: f64,
    /// Well centre Y offset in millimetres.
    pub y_mm: f64,
}

impl fmt::Display for WellLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} on {} ({:.2}, {:.2})",
            self.well, self.labware, self.deck_slot, self.x_mm, self.y_mm
        )
    }
}

fn default_labware_name() -> String {
    "opentrons-tiprack-300ul".to_string()
}

fn default_deck_slot() -> u8 {
    1
}

/// Labware loaded on the deck: a tip rack or a well plate.
///
/// # TOML Example
///
/// ```toml
/// [[pipette.tip_racks]]
/// name = "opentrons-tiprack-300ul"
/// deck_slot = 1
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Labware {
    /// Labware definition name.
    #[serde(default = "default_labware_name")]
    pub name: String,

    /// Deck position (1-12).
    #[serde(default = "default_deck_slot")]
    pub deck_slot: u8,

    /// Grid size; 8 x 12 unless stated.
    #[serde(default)]
    pub dimensions: RackDimensions,
}

impl Labware {
    /// Create a standard 96-position labware in a deck slot.
    pub fn new(name: impl Into<String>, deck_slot: u8) -> Self {
        Self {
            name: name.into(),
            deck_slot,
            dimensions: RackDimensions::STANDARD,
        }
    }

    /// Replace the grid size.
    pub fn with_dimensions(mut self, dimensions: RackDimensions) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Validate name, deck slot and grid size.
    pub fn validate(&self) -> Result<(), DriverError> {
        if self.name.is_empty() {
            return Err(DriverError::ConfigError(
                "labware name cannot be empty".to_string(),
            ));
        }
        if self.deck_slot == 0 || self.deck_slot > DECK_SLOTS {
            return Err(DriverError::ConfigError(format!(
                "labware '{}' deck_slot {} outside 1..={}",
                self.name, self.deck_slot, DECK_SLOTS
            )));
        }
        if !self.dimensions.is_valid() {
            return Err(DriverError::ConfigError(format!(
                "labware '{}' has invalid dimensions {}x{}",
                self.name, self.dimensions.rows, self.dimensions.columns
            )));
        }
        Ok(())
    }

    /// Location of a well given by name, e.g. `"A1"`.
    pub fn well(&self, name: &str) -> Result<WellLocation, DriverError> {
        let slot = name
            .parse::<SlotId>()
            .map_err(|e| DriverError::InvalidLocation(e.to_string()))?;
        self.resolve(slot)
    }
}

impl Default for Labware {
    fn default() -> Self {
        Self::new(default_labware_name(), default_deck_slot())
    }
}

impl LocationResolver for Labware {
    fn resolve(&self, slot: SlotId) -> Result<WellLocation, DriverError> {
        if !self.dimensions.contains(slot) {
            return Err(DriverError::InvalidLocation(format!(
                "{} is not a well of {} ({}x{})",
                slot, self.name, self.dimensions.rows, self.dimensions.columns
            )));
        }
        Ok(WellLocation {
            labware: self.name.clone(),
            deck_slot: self.deck_slot,
            well: slot,
            x_mm: A1_X_MM + f64::from(slot.column() - 1) * WELL_PITCH_MM,
            y_mm: A1_Y_MM - f64::from(slot.row()) * WELL_PITCH_MM,
        })
    }
}
