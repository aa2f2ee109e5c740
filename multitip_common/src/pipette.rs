//! Pipette instrument interface.
//!
//! This module contains the driver trait and the labware/location types
//! exchanged between the wrapper layer and instrument drivers.

pub mod driver;
pub mod labware;
pub mod types;
