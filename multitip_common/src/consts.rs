//! System-wide constants for the multitip workspace.
//!
//! Single source of truth for rack geometry and default paths.

use static_assertions::const_assert;

/// Number of rows (A..H) on a standard 96-position tip rack.
pub const RACK_ROWS: u8 = 8;

/// Number of columns (1..12) on a standard 96-position tip rack.
pub const RACK_COLUMNS: u8 = 12;

/// Number of channels on a multichannel head.
pub const HEAD_CHANNELS: u8 = 8;

/// Tips requested when the caller does not say otherwise.
pub const DEFAULT_NUM_TIPS: u8 = HEAD_CHANNELS;

/// Upper bound on rows: one letter per row.
pub const MAX_ROWS: u8 = 26;

/// Upper bound on columns.
pub const MAX_COLUMNS: u8 = 99;

/// Number of deck positions a labware can be loaded into.
pub const DECK_SLOTS: u8 = 12;

/// Well pitch of the 96-well SBS footprint in millimetres.
pub const WELL_PITCH_MM: f64 = 9.0;

/// X offset of well A1 from the labware origin in millimetres.
pub const A1_X_MM: f64 = 14.38;

/// Y offset of well A1 from the labware origin in millimetres.
pub const A1_Y_MM: f64 = 74.24;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/multitip/multitip.toml";

const_assert!(RACK_ROWS <= MAX_ROWS);
const_assert!(RACK_COLUMNS <= MAX_COLUMNS);
const_assert!(HEAD_CHANNELS <= RACK_ROWS);
