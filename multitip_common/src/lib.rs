//! multitip Common Library
//!
//! This crate provides shared constants, configuration loading utilities and
//! the pipette driver interface for all multitip workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Rack geometry, head capacity and default paths
//! - [`config`] - Configuration loading traits and types
//! - [`rack`] - Slot identifiers and slot states
//! - [`pipette`] - Pipette driver trait, labware and location types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use multitip_common::prelude::*;
//!
//! let slot: SlotId = "E1".parse().unwrap();
//! assert_eq!(slot.column(), 1);
//! ```

pub mod config;
pub mod consts;
pub mod pipette;
pub mod prelude;
pub mod rack;
