//! Per-instrument voice state and allocation policy.

use crate::backend::VoiceHandle;
use crate::bend::BEND_CENTER;

/// How an instrument's notes are assigned to its voices.
///
/// Chosen at load time; it also fixes how the instrument's tuning table is
/// keyed (absolute note vs. pitch class).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationPolicy {
    /// The caller names the voice directly (MIDI-channel style). Tuning is
    /// keyed by absolute note number (0-127).
    #[default]
    FixedChannel,
    /// `note % 12`: all octaves of a pitch class share one voice. Tuning is
    /// keyed by pitch class (0-11).
    PitchClass,
}

impl AllocationPolicy {
    /// Largest valid tuning-table key under this policy.
    pub fn max_key(&self) -> u8 {
        match self {
            Self::FixedChannel => 127,
            Self::PitchClass => 11,
        }
    }

    /// Tuning-table key for a note under this policy.
    pub fn key_for(&self, note: u8) -> u8 {
        match self {
            Self::FixedChannel => note,
            Self::PitchClass => note % 12,
        }
    }

    /// Voice count when the caller does not specify one.
    ///
    /// FixedChannel defaults to the 16 MIDI channels; PitchClass always
    /// uses one voice per pitch class.
    pub fn default_voices(&self) -> usize {
        match self {
            Self::FixedChannel => 16,
            Self::PitchClass => 12,
        }
    }
}

/// State of one synthesis voice owned by an instrument.
#[derive(Debug, Clone)]
pub struct Voice {
    /// Backend handle for this voice.
    pub handle: VoiceHandle,
    /// Currently loaded bank.
    pub bank: u32,
    /// Currently loaded program.
    pub program: u32,
    /// Active pitch-bend value (starts at center: no bend).
    pub bend: u16,
}

impl Voice {
    pub fn new(handle: VoiceHandle, bank: u32, program: u32) -> Self {
        Self {
            handle,
            bank,
            program,
            bend: BEND_CENTER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_keys() {
        let policy = AllocationPolicy::PitchClass;
        assert_eq!(policy.key_for(60), 0);
        assert_eq!(policy.key_for(72), 0);
        assert_eq!(policy.key_for(61), 1);
        assert_eq!(policy.key_for(127), 7);
        assert_eq!(policy.max_key(), 11);
        assert_eq!(policy.default_voices(), 12);
    }

    #[test]
    fn test_fixed_channel_keys() {
        let policy = AllocationPolicy::FixedChannel;
        assert_eq!(policy.key_for(60), 60);
        assert_eq!(policy.max_key(), 127);
        assert_eq!(policy.default_voices(), 16);
    }

    #[test]
    fn test_new_voice_starts_centered() {
        let voice = Voice::new(VoiceHandle::new(3), 0, 42);
        assert_eq!(voice.bend, BEND_CENTER);
        assert_eq!(voice.program, 42);
    }
}
