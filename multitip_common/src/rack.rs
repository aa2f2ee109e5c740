//! Rack geometry value types.
//!
//! - `SlotId` - One tip position, written as row letter + column (`"E1"`)
//! - `SlotState` - Available / Consumed
//! - `RackDimensions` - Row and column count of a rack

use crate::consts::{MAX_COLUMNS, MAX_ROWS, RACK_COLUMNS, RACK_ROWS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a slot name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSlotIdError {
    /// Input was empty.
    #[error("empty slot name")]
    Empty,

    /// First character is not a letter A-Z.
    #[error("invalid row letter in slot name '{0}'")]
    InvalidRow(String),

    /// Column part is missing, not a number, or zero.
    #[error("invalid column in slot name '{0}'")]
    InvalidColumn(String),
}

/// Identifier of one slot: a row letter and a 1-based column number.
///
/// Row index 0 is `A`, the physically highest row of a rack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotId {
    row: u8,
    column: u8,
}

impl SlotId {
    /// Create a slot id from a row index (0 = `A`) and a 1-based column.
    ///
    /// Returns `None` when the row has no letter or the column is zero.
    pub const fn new(row: u8, column: u8) -> Option<Self> {
        if row >= MAX_ROWS || column == 0 || column > MAX_COLUMNS {
            return None;
        }
        Some(Self { row, column })
    }

    /// Row index, 0 = `A`.
    #[inline]
    pub const fn row(&self) -> u8 {
        self.row
    }

    /// Row letter (`A`..`Z`).
    #[inline]
    pub const fn row_letter(&self) -> char {
        (b'A' + self.row) as char
    }

    /// 1-based column number.
    #[inline]
    pub const fn column(&self) -> u8 {
        self.column
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.column)
    }
}

impl FromStr for SlotId {
    type Err = ParseSlotIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().ok_or(ParseSlotIdError::Empty)?;
        if !letter.is_ascii_alphabetic() {
            return Err(ParseSlotIdError::InvalidRow(s.to_string()));
        }
        let row = letter.to_ascii_uppercase() as u8 - b'A';
        // Plain digits without a leading zero, so the text round-trips.
        let digits = chars.as_str();
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ParseSlotIdError::InvalidColumn(s.to_string()));
        }
        let column: u8 = digits
            .parse()
            .map_err(|_| ParseSlotIdError::InvalidColumn(s.to_string()))?;
        SlotId::new(row, column).ok_or_else(|| ParseSlotIdError::InvalidColumn(s.to_string()))
    }
}

impl TryFrom<String> for SlotId {
    type Error = ParseSlotIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SlotId> for String {
    fn from(slot: SlotId) -> Self {
        slot.to_string()
    }
}

/// Availability of a single slot.
///
/// The only transition is `Available -> Consumed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    /// Tip present, never used.
    #[default]
    Available,
    /// Tip taken.
    Consumed,
}

/// Size of a rack grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RackDimensions {
    /// Rows per column (A..).
    pub rows: u8,
    /// Columns (1..).
    pub columns: u8,
}

impl RackDimensions {
    /// Standard 96-position rack: 8 rows by 12 columns.
    pub const STANDARD: Self = Self {
        rows: RACK_ROWS,
        columns: RACK_COLUMNS,
    };

    /// Create new dimensions. Validity is checked by [`RackDimensions::is_valid`].
    pub const fn new(rows: u8, columns: u8) -> Self {
        Self { rows, columns }
    }

    /// True when every row has a letter and the grid is not empty.
    pub const fn is_valid(&self) -> bool {
        self.rows >= 1 && self.rows <= MAX_ROWS && self.columns >= 1 && self.columns <= MAX_COLUMNS
    }

    /// Total slot count.
    pub const fn slot_count(&self) -> usize {
        self.rows as usize * self.columns as usize
    }

    /// True when `slot` lies inside this grid.
    pub const fn contains(&self, slot: SlotId) -> bool {
        slot.row < self.rows && slot.column <= self.columns
    }
}

impl Default for RackDimensions {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_id_display() {
        assert_eq!(SlotId::new(7, 1).unwrap().to_string(), "H1");
        assert_eq!(SlotId::new(0, 12).unwrap().to_string(), "A12");
    }

    #[test]
    fn slot_id_parse() {
        let slot: SlotId = "E1".parse().unwrap();
        assert_eq!(slot.row(), 4);
        assert_eq!(slot.row_letter(), 'E');
        assert_eq!(slot.column(), 1);

        let slot: SlotId = "h12".parse().unwrap();
        assert_eq!(slot, SlotId::new(7, 12).unwrap());
    }

    #[test]
    fn slot_id_parse_errors() {
        assert_eq!("".parse::<SlotId>(), Err(ParseSlotIdError::Empty));
        assert!(matches!("1A".parse::<SlotId>(), Err(ParseSlotIdError::InvalidRow(_))));
        assert!(matches!("A".parse::<SlotId>(), Err(ParseSlotIdError::InvalidColumn(_))));
        assert!(matches!("A0".parse::<SlotId>(), Err(ParseSlotIdError::InvalidColumn(_))));
        assert!(matches!("Ax".parse::<SlotId>(), Err(ParseSlotIdError::InvalidColumn(_))));
    }

    #[test]
    fn slot_id_parse_rejects_text_that_would_not_round_trip() {
        for text in ["A+5", "A05", "A 5", "A-1", "A300"] {
            assert!(
                matches!(text.parse::<SlotId>(), Err(ParseSlotIdError::InvalidColumn(_))),
                "{text} should not parse"
            );
        }
        for text in ["A1", "H12", "Z99"] {
            assert_eq!(text.parse::<SlotId>().unwrap().to_string(), text);
        }
    }

    #[test]
    fn slot_id_serializes_as_name() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Wrapper {
            slot: SlotId,
        }

        let wrapper = Wrapper {
            slot: SlotId::new(4, 1).unwrap(),
        };
        let text = toml::to_string(&wrapper).unwrap();
        assert!(text.contains("\"E1\""));
        assert_eq!(toml::from_str::<Wrapper>(&text).unwrap(), wrapper);
        assert!(toml::from_str::<Wrapper>("slot = \"??\"").is_err());
    }

    #[test]
    fn slot_id_ordering_is_row_then_column() {
        let a2: SlotId = "A2".parse().unwrap();
        let b1: SlotId = "B1".parse().unwrap();
        assert!(a2 < b1);
    }

    #[test]
    fn dimensions_validity() {
        assert!(RackDimensions::STANDARD.is_valid());
        assert!(!RackDimensions::new(0, 12).is_valid());
        assert!(!RackDimensions::new(8, 0).is_valid());
        assert!(!RackDimensions::new(27, 12).is_valid());
        assert_eq!(RackDimensions::default().slot_count(), 96);
    }

    #[test]
    fn dimensions_contains() {
        let dims = RackDimensions::STANDARD;
        assert!(dims.contains("H12".parse().unwrap()));
        assert!(!dims.contains("I1".parse().unwrap()));
        assert!(!dims.contains("A13".parse().unwrap()));
    }
}
