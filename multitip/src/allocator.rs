//! Tip rack allocator.
//!
//! Tracks which tips of a single rack have been used and hands out
//! contiguous vertical blocks of up to eight tips, so a multichannel head can
//! pick up fewer tips than it has channels.
//!
//! # Traversal order
//!
//! Within a column the allocator walks from the physically lowest row (`H`
//! on a standard rack) up to `A`. A block of `n` tips is `n` consecutive
//! slots in that order, and the slot handed back is the last one of the
//! block: the slot the head's first channel must be placed over so the
//! remaining `n - 1` channels hang below it on the block.
//!
//! ```text
//!            col 1
//!   A  ─┐
//!   B   │
//!   C   │   traversal
//!   D   │   (last)
//!   E ◄─┼── allocate(4) returns E1
//!   F   │
//!   G   │
//!   H  ─┘   (first)
//! ```

use multitip_common::consts::HEAD_CHANNELS;
use multitip_common::rack::{RackDimensions, SlotId, SlotState};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// Error types for rack allocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RackError {
    /// Requested count outside `1..=head capacity`
    #[error("Invalid request: cannot take {requested} tips (head capacity {capacity})")]
    InvalidRequest {
        /// Count asked for.
        requested: usize,
        /// Largest count the rack can serve.
        capacity: u8,
    },

    /// No column has a block of the requested size left
    #[error("Out of tips: no column has {requested} contiguous unused tips")]
    OutOfTips {
        /// Count asked for.
        requested: usize,
    },

    /// Rack dimensions cannot be represented
    #[error("Invalid rack dimensions {rows}x{columns}")]
    InvalidDimensions {
        /// Rows asked for.
        rows: u8,
        /// Columns asked for.
        columns: u8,
    },

    /// Slot lies outside the rack
    #[error("Slot {0} is not part of the rack")]
    UnknownSlot(SlotId),

    /// Snapshot slots do not match its dimensions
    #[error("Invalid rack snapshot: {0}")]
    InvalidSnapshot(String),
}

/// One tip position and its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotEntry {
    /// Slot identifier.
    pub slot: SlotId,
    /// Current state.
    pub state: SlotState,
}

/// Point-in-time copy of every slot of a rack.
///
/// Slots are ordered column by column (1, 2, ...), and bottom to top
/// within each column.
///
/// Deserializing checks that the slots form exactly that layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRecord")]
pub struct RackSnapshot {
    dimensions: RackDimensions,
    slots: Vec<SlotEntry>,
}

#[derive(Deserialize)]
struct SnapshotRecord {
    dimensions: RackDimensions,
    slots: Vec<SlotEntry>,
}

impl TryFrom<SnapshotRecord> for RackSnapshot {
    type Error = RackError;

    fn try_from(record: SnapshotRecord) -> Result<Self, Self::Error> {
        let SnapshotRecord { dimensions, slots } = record;
        if !dimensions.is_valid() {
            return Err(RackError::InvalidDimensions {
                rows: dimensions.rows,
                columns: dimensions.columns,
            });
        }
        if slots.len() != dimensions.slot_count() {
            return Err(RackError::InvalidSnapshot(format!(
                "{} slots for a {}x{} rack",
                slots.len(),
                dimensions.rows,
                dimensions.columns
            )));
        }

        let rows = dimensions.rows as usize;
        for (index, entry) in slots.iter().enumerate() {
            let column = (index / rows) as u8 + 1;
            let row = (rows - 1 - index % rows) as u8;
            if SlotId::new(row, column) != Some(entry.slot) {
                return Err(RackError::InvalidSnapshot(format!(
                    "slot {} out of layout order at position {}",
                    entry.slot, index
                )));
            }
        }
        Ok(Self { dimensions, slots })
    }
}

impl RackSnapshot {
    /// Grid size.
    pub fn dimensions(&self) -> RackDimensions {
        self.dimensions
    }

    /// All slots in physical layout order.
    pub fn slots(&self) -> &[SlotEntry] {
        &self.slots
    }

    /// State of `slot`, or `None` if it is not on the rack.
    pub fn state_of(&self, slot: SlotId) -> Option<SlotState> {
        self.slots
            .iter()
            .find(|entry| entry.slot == slot)
            .map(|entry| entry.state)
    }

    /// Slots that have been consumed.
    pub fn consumed(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.slots
            .iter()
            .filter(|entry| entry.state == SlotState::Consumed)
            .map(|entry| entry.slot)
    }

    /// Number of slots still available.
    pub fn available_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.state == SlotState::Available)
            .count()
    }
}

/// Renders the rack as seen from above, row `A` on top.
/// `.` marks an available tip, `x` a consumed one.
impl fmt::Display for RackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.dimensions.rows as usize;
        let columns = self.dimensions.columns as usize;

        write!(f, "  ")?;
        for column in 1..=columns {
            write!(f, "{column:>3}")?;
        }
        writeln!(f)?;

        for row in 0..rows {
            write!(f, "{} ", (b'A' + row as u8) as char)?;
            for column in 0..columns {
                let entry = &self.slots[column * rows + (rows - 1 - row)];
                let mark = match entry.state {
                    SlotState::Available => '.',
                    SlotState::Consumed => 'x',
                };
                write!(f, "{mark:>3}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Allocator over a single tip rack.
///
/// Owns the slot grid. Not internally synchronized: `allocate` takes
/// `&mut self`, callers sharing one rack wrap it in their own lock.
#[derive(Debug, Clone)]
pub struct TipRackAllocator {
    dimensions: RackDimensions,
    /// `columns[c][p]`: column `c + 1`, traversal position `p` (0 = bottom row).
    columns: Vec<Vec<SlotEntry>>,
}

impl TipRackAllocator {
    /// Create a rack with every slot available.
    ///
    /// # Errors
    /// Returns `RackError::InvalidDimensions` if rows or columns are zero or
    /// too large to name.
    pub fn new(dimensions: RackDimensions) -> Result<Self, RackError> {
        let invalid = RackError::InvalidDimensions {
            rows: dimensions.rows,
            columns: dimensions.columns,
        };
        if !dimensions.is_valid() {
            return Err(invalid);
        }

        let mut columns = Vec::with_capacity(dimensions.columns as usize);
        for column in 1..=dimensions.columns {
            let slots = (0..dimensions.rows)
                .rev()
                .map(|row| {
                    SlotId::new(row, column).map(|slot| SlotEntry {
                        slot,
                        state: SlotState::Available,
                    })
                })
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| invalid.clone())?;
            columns.push(slots);
        }

        debug!(
            "Created {}x{} tip rack",
            dimensions.rows, dimensions.columns
        );
        Ok(Self {
            dimensions,
            columns,
        })
    }

    /// Standard 8 x 12 rack.
    pub fn standard() -> Self {
        Self::default()
    }

    /// Rebuild a rack in which `consumed` slots are already used.
    ///
    /// # Errors
    /// Returns `RackError::UnknownSlot` for a slot outside the grid.
    pub fn restore<I>(dimensions: RackDimensions, consumed: I) -> Result<Self, RackError>
    where
        I: IntoIterator<Item = SlotId>,
    {
        let mut rack = Self::new(dimensions)?;
        for slot in consumed {
            let (column, position) = rack.position_of(slot).ok_or(RackError::UnknownSlot(slot))?;
            rack.columns[column][position].state = SlotState::Consumed;
        }
        debug!("Restored rack with {} consumed slots", rack.consumed());
        Ok(rack)
    }

    /// Grid size.
    pub fn dimensions(&self) -> RackDimensions {
        self.dimensions
    }

    /// Largest block a single call can take: rows per column, bounded by
    /// the head's channel count.
    pub fn head_capacity(&self) -> u8 {
        self.dimensions.rows.min(HEAD_CHANNELS)
    }

    /// Number of available slots.
    pub fn available(&self) -> usize {
        self.dimensions.slot_count() - self.consumed()
    }

    /// Number of consumed slots.
    pub fn consumed(&self) -> usize {
        self.columns
            .iter()
            .flatten()
            .filter(|entry| entry.state == SlotState::Consumed)
            .count()
    }

    /// State of `slot`, or `None` if it is not on the rack.
    pub fn state(&self, slot: SlotId) -> Option<SlotState> {
        self.position_of(slot)
            .map(|(column, position)| self.columns[column][position].state)
    }

    /// Take the next block of `n` contiguous unused tips.
    ///
    /// Columns are scanned left to right and, within a column, blocks are
    /// tried from the bottom row up. The first block with no consumed slot
    /// is marked consumed as a whole, and its topmost slot is returned.
    ///
    /// # Errors
    /// - `RackError::InvalidRequest` if `n` is 0 or larger than [`Self::head_capacity`]
    /// - `RackError::OutOfTips` if no column holds `n` contiguous unused tips
    ///
    /// The rack is unchanged when an error is returned.
    pub fn allocate(&mut self, n: usize) -> Result<SlotId, RackError> {
        let capacity = self.head_capacity();
        if n == 0 || n > capacity as usize {
            return Err(RackError::InvalidRequest {
                requested: n,
                capacity,
            });
        }

        let Some((column, start)) = self.find_block(n) else {
            warn!("No block of {} tips left ({} tips available)", n, self.available());
            return Err(RackError::OutOfTips { requested: n });
        };

        let block = &mut self.columns[column][start..start + n];
        for entry in block.iter_mut() {
            entry.state = SlotState::Consumed;
        }
        let slot = block[n - 1].slot;

        debug!("Allocated {} tips in column {}, reference slot {}", n, column + 1, slot);
        Ok(slot)
    }

    /// Copy of every slot's state, column by column, bottom to top.
    pub fn snapshot(&self) -> RackSnapshot {
        RackSnapshot {
            dimensions: self.dimensions,
            slots: self.columns.iter().flatten().copied().collect(),
        }
    }

    /// First `(column index, start position)` whose `n` slots are all available.
    fn find_block(&self, n: usize) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(column, slots)| {
            slots
                .windows(n)
                .position(|block| block.iter().all(|entry| entry.state == SlotState::Available))
                .map(|start| (column, start))
        })
    }

    fn position_of(&self, slot: SlotId) -> Option<(usize, usize)> {
        if !self.dimensions.contains(slot) {
            return None;
        }
        let column = slot.column() as usize - 1;
        let position = (self.dimensions.rows - 1 - slot.row()) as usize;
        Some((column, position))
    }
}

impl Default for TipRackAllocator {
    fn default() -> Self {
        Self::new(RackDimensions::STANDARD).expect("standard rack dimensions are valid")
    }
}
