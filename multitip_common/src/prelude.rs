//! Prelude module for common re-exports.
//!
//! ```rust
//! use multitip_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, MultitipConfig, PipetteConfig, SharedConfig};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{DEFAULT_NUM_TIPS, HEAD_CHANNELS, RACK_COLUMNS, RACK_ROWS};

// ─── Rack ───────────────────────────────────────────────────────────
pub use crate::rack::{ParseSlotIdError, RackDimensions, SlotId, SlotState};

// ─── Pipette ────────────────────────────────────────────────────────
pub use crate::pipette::driver::{DriverError, DriverFactory, PipetteDriver};
pub use crate::pipette::labware::{Labware, LocationResolver, WellLocation};
pub use crate::pipette::types::{TransferKind, TransferPlan};
