//! # multitip
//!
//! Drive an 8-channel pipette head with any number of tips from 1 to 8.
//!
//! # Module Structure
//!
//! - [`allocator`] - Tip rack allocator (which tips are left, which block to take)
//! - [`persistence`] - Rack state saved between runs
//! - [`wrapper`] - Facade that feeds allocated tip locations to the driver
//! - [`commands`] - Command flows run by the `multitip` binary
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Pipette driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      PipetteWrapper                      │
//! │  ┌──────────────────┐  SlotId   ┌─────────────────────┐  │
//! │  │ TipRackAllocator │─────────► │ Labware (resolver)  │  │
//! │  └──────────────────┘           └──────────┬──────────┘  │
//! │                                WellLocation│             │
//! │                                            ▼             │
//! │                                 ┌─────────────────────┐  │
//! │                                 │    PipetteDriver    │  │
//! │                                 └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]

pub mod allocator;
pub mod commands;
pub mod driver_registry;
pub mod drivers;
pub mod persistence;
pub mod wrapper;

// Re-export key types for convenience
pub use crate::allocator::{RackError, RackSnapshot, TipRackAllocator};
pub use crate::commands::{CommandError, Session};
pub use crate::driver_registry::DriverRegistry;
pub use crate::persistence::RackStatePersistence;
pub use crate::wrapper::{PipetteWrapper, WrapperError};
