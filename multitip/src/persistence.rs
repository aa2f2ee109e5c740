//! Rack state persistence.
//!
//! Saves the consumed-slot set of a rack so that successive runs against
//! the same physical rack continue where the previous one stopped.
//! State is persisted using bincode for compact binary serialization.

use crate::allocator::{RackError, TipRackAllocator};
use multitip_common::rack::{RackDimensions, SlotId};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for rack state persistence.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Filesystem access failed
    #[error("State file I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// State could not be encoded or decoded
    #[error("State file encoding error: {0}")]
    Encoding(String),

    /// Stored slots do not fit the rack
    #[error("Stored rack state is invalid: {0}")]
    Rack(#[from] RackError),
}

/// On-disk form of a rack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedRack {
    /// Version of state format (for migration)
    pub version: u32,
    /// Grid size of the saved rack
    pub dimensions: RackDimensions,
    /// Consumed slots
    pub consumed: Vec<SlotId>,
    /// Timestamp of last save (Unix epoch seconds)
    pub saved_at: u64,
}

impl PersistedRack {
    /// Current state format version.
    pub const CURRENT_VERSION: u32 = 1;

    /// Capture the consumed slots of `rack`.
    pub fn from_rack(rack: &TipRackAllocator) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            dimensions: rack.dimensions(),
            consumed: rack.snapshot().consumed().collect(),
            saved_at: 0,
        }
    }
}

/// Rack state persistence manager.
pub struct RackStatePersistence {
    path: PathBuf,
}

impl RackStatePersistence {
    /// Create a new persistence manager.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save the consumed slots of `rack`.
    ///
    /// The state is written to a temporary file next to the target and
    /// renamed over it, so the previous state survives a failed save.
    pub fn save(&self, rack: &TipRackAllocator) -> Result<(), PersistenceError> {
        debug!("Saving rack state to {:?}", self.path);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut state = PersistedRack::from_rack(rack);
        state.saved_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut file = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            bincode::serialize_into(&mut writer, &state)
                .map_err(|e| PersistenceError::Encoding(e.to_string()))?;
            writer.flush()?;
        }
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        info!(
            "Saved rack state ({} consumed) to {:?}",
            state.consumed.len(),
            self.path
        );
        Ok(())
    }

    /// Load a rack of `dimensions` from the state file.
    ///
    /// Returns `Ok(None)` when there is no state file, when it was written by
    /// another format version, or when it describes a rack of another size.
    pub fn load(
        &self,
        dimensions: RackDimensions,
    ) -> Result<Option<TipRackAllocator>, PersistenceError> {
        debug!("Loading rack state from {:?}", self.path);

        if !self.path.exists() {
            debug!("State file does not exist, starting fresh");
            return Ok(None);
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let state: PersistedRack = bincode::deserialize_from(reader)
            .map_err(|e| PersistenceError::Encoding(e.to_string()))?;

        if state.version != PersistedRack::CURRENT_VERSION {
            warn!(
                "State file version {} differs from current {}, starting fresh",
                state.version,
                PersistedRack::CURRENT_VERSION
            );
            return Ok(None);
        }

        if state.dimensions != dimensions {
            warn!(
                "State file describes a {}x{} rack, expected {}x{}; starting fresh",
                state.dimensions.rows, state.dimensions.columns, dimensions.rows, dimensions.columns
            );
            return Ok(None);
        }

        let rack = TipRackAllocator::restore(dimensions, state.consumed)?;
        info!(
            "Loaded rack state ({} consumed, saved at {}) from {:?}",
            rack.consumed(),
            state.saved_at,
            self.path
        );
        Ok(Some(rack))
    }

    /// Load the saved rack, or create a fresh one.
    pub fn load_or_new(
        &self,
        dimensions: RackDimensions,
    ) -> Result<TipRackAllocator, PersistenceError> {
        match self.load(dimensions)? {
            Some(rack) => Ok(rack),
            None => Ok(TipRackAllocator::new(dimensions)?),
        }
    }

    /// Delete state file.
    pub fn delete(&self) -> Result<(), PersistenceError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            info!("Deleted rack state file {:?}", self.path);
        }
        Ok(())
    }
}
