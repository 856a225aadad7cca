//! Per-instrument tuning table.
//!
//! Stores one offset (in semitones) per note key, where the key space
//! follows the instrument's allocation policy: absolute MIDI note (0-127)
//! or pitch class (0-11). Entries persist until overwritten or the owning
//! instrument is unloaded.

use crate::error::{Error, Result};
use crate::voice::AllocationPolicy;

/// Tuning offsets for one instrument.
///
/// Fixed-size table: lookup is a plain array index, no allocation after
/// construction.
#[derive(Debug, Clone)]
pub struct TuningTable {
    policy: AllocationPolicy,
    offsets: [Option<f64>; 128],
}

impl TuningTable {
    pub fn new(policy: AllocationPolicy) -> Self {
        Self {
            policy,
            offsets: [None; 128],
        }
    }

    /// Validate a note key against this table's key space.
    pub fn check_key(&self, key: u8) -> Result<()> {
        if key > self.policy.max_key() {
            return Err(Error::InvalidNote {
                key: key as i64,
                max: self.policy.max_key(),
            });
        }
        Ok(())
    }

    /// Store an offset (semitones) for a note key, replacing any previous
    /// entry. The caller is expected to have sanitized the offset already.
    pub fn set(&mut self, key: u8, offset: f64) -> Result<()> {
        self.check_key(key)?;
        self.offsets[key as usize] = Some(offset);
        Ok(())
    }

    /// Offset stored for a key, if any.
    pub fn get(&self, key: u8) -> Option<f64> {
        self.offsets.get(key as usize).copied().flatten()
    }

    /// Offset that applies to a note, resolved through the policy's key
    /// mapping. `None` means no tuning stored (play at center).
    pub fn offset_for_note(&self, note: u8) -> Option<f64> {
        self.get(self.policy.key_for(note))
    }

    pub fn len(&self) -> usize {
        self.offsets.iter().filter(|entry| entry.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.iter().all(|entry| entry.is_none())
    }
}
