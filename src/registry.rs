//! Instrument registry: voice allocation, tuning, and note lifecycle.
//!
//! All per-instrument state (voices, tuning table, active-note map) lives
//! in one arena keyed by [`InstrumentId`], and every mutation goes through
//! registry methods so the invariants stay enforceable in one place. Each
//! operation locks exactly one registry entry, which serializes mutations
//! of a given instrument while distinct instruments proceed independently.

use crate::backend::AudioBackend;
use crate::bend;
use crate::error::{Error, Result};
use crate::tuning::TuningTable;
use crate::voice::{AllocationPolicy, Voice};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Handle to a loaded instrument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstrumentId(u64);

impl InstrumentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the internal ID (for debugging/logging only)
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Configuration for loading an instrument.
#[derive(Debug, Clone)]
pub struct InstrumentConfig {
    /// Sound-bank file to load into every voice.
    pub path: PathBuf,
    /// Initial bank.
    pub bank: u32,
    /// Initial program.
    pub program: u32,
    /// Note-to-voice assignment policy (also fixes the tuning key space).
    pub allocation: AllocationPolicy,
    /// Voice count under FixedChannel; ignored under PitchClass, which
    /// always creates one voice per pitch class.
    pub voices: usize,
}

impl InstrumentConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            bank: 0,
            program: 0,
            allocation: AllocationPolicy::FixedChannel,
            voices: AllocationPolicy::FixedChannel.default_voices(),
        }
    }

    pub fn allocation(mut self, allocation: AllocationPolicy) -> Self {
        self.allocation = allocation;
        self
    }

    pub fn bank_program(mut self, bank: u32, program: u32) -> Self {
        self.bank = bank;
        self.program = program;
        self
    }

    pub fn voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }
}

struct Instrument {
    config: InstrumentConfig,
    voices: Vec<Voice>,
    tuning: TuningTable,
    /// note (0-127) -> index into `voices` for notes currently sounding
    active: [Option<usize>; 128],
}

impl Instrument {
    /// Voice index that plays `note`, per the allocation policy.
    fn voice_index(&self, note: u8, channel: Option<u8>) -> Result<usize> {
        match self.config.allocation {
            AllocationPolicy::PitchClass => Ok((note % 12) as usize),
            AllocationPolicy::FixedChannel => {
                let channel = channel.unwrap_or(0);
                let index = channel as usize;
                if index >= self.voices.len() {
                    return Err(Error::InvalidChannel {
                        channel: channel as i64,
                        voices: self.voices.len(),
                    });
                }
                Ok(index)
            }
        }
    }
}

/// Owns all instruments and routes notes, bends, and teardown to the backend.
pub struct VoiceRouter {
    backend: Arc<dyn AudioBackend>,
    instruments: DashMap<u64, Instrument>,
    next_id: AtomicU64,
}

impl VoiceRouter {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            backend,
            instruments: DashMap::new(),
            // Instrument ids are handed to callers; start at 1 so 0 never
            // aliases a live handle.
            next_id: AtomicU64::new(1),
        }
    }

    /// Load an instrument: create its voices and load the sound bank into
    /// each. All-or-nothing: on any failure every voice already created is
    /// released and no registry entry is made.
    pub fn load(&self, config: InstrumentConfig) -> Result<InstrumentId> {
        let voice_count = match config.allocation {
            AllocationPolicy::PitchClass => AllocationPolicy::PitchClass.default_voices(),
            AllocationPolicy::FixedChannel => config.voices,
        };
        if voice_count == 0 {
            return Err(Error::InvalidArguments(
                "instrument must have at least one voice".to_string(),
            ));
        }

        let mut voices: Vec<Voice> = Vec::with_capacity(voice_count);
        for _ in 0..voice_count {
            let handle = match self.backend.create_voice() {
                Ok(handle) => handle,
                Err(err) => {
                    Self::release_all(self.backend.as_ref(), &voices);
                    return Err(err);
                }
            };
            if let Err(err) =
                self.backend
                    .load_instrument(handle, &config.path, config.bank, config.program)
            {
                self.backend.release_voice(handle);
                Self::release_all(self.backend.as_ref(), &voices);
                return Err(err);
            }
            voices.push(Voice::new(handle, config.bank, config.program));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            "loaded instrument {id}: {} voices from {}",
            voices.len(),
            config.path.display()
        );
        let tuning = TuningTable::new(config.allocation);
        self.instruments.insert(
            id,
            Instrument {
                config,
                voices,
                tuning,
                active: [None; 128],
            },
        );
        Ok(InstrumentId(id))
    }

    /// Re-load a bank/program on one voice of an instrument.
    pub fn select_instrument(
        &self,
        id: InstrumentId,
        channel: u8,
        bank: u32,
        program: u32,
    ) -> Result<()> {
        let mut entry = self
            .instruments
            .get_mut(&id.0)
            .ok_or(Error::InstrumentNotFound(id.0))?;
        let inst = entry.value_mut();
        let index = channel as usize;
        if index >= inst.voices.len() {
            return Err(Error::InvalidChannel {
                channel: channel as i64,
                voices: inst.voices.len(),
            });
        }
        let path = inst.config.path.clone();
        self.backend
            .load_instrument(inst.voices[index].handle, &path, bank, program)?;
        inst.voices[index].bank = bank;
        inst.voices[index].program = program;
        Ok(())
    }

    /// Resolve the voice for a note, apply its stored tuning, record it in
    /// the active-note map, then trigger sound.
    pub fn play_note(
        &self,
        id: InstrumentId,
        note: u8,
        velocity: u8,
        channel: Option<u8>,
    ) -> Result<()> {
        Self::check_note(note)?;
        Self::check_velocity(velocity)?;
        let mut entry = self
            .instruments
            .get_mut(&id.0)
            .ok_or(Error::InstrumentNotFound(id.0))?;
        let inst = entry.value_mut();
        let index = inst.voice_index(note, channel)?;

        // Stored tuning (or center when none) goes out before the note-on,
        // through the same path set_tuning uses.
        let offset = inst.tuning.offset_for_note(note).unwrap_or(0.0);
        Self::apply_bend(
            self.backend.as_ref(),
            &mut inst.voices[index],
            bend::bend_value(offset),
        )?;
        self.backend
            .start_note(inst.voices[index].handle, note, velocity)?;
        inst.active[note as usize] = Some(index);
        Ok(())
    }

    /// Stop a note. Stopping a note that is not sounding is a no-op.
    pub fn stop_note(&self, id: InstrumentId, note: u8) -> Result<()> {
        Self::check_note(note)?;
        let mut entry = self
            .instruments
            .get_mut(&id.0)
            .ok_or(Error::InstrumentNotFound(id.0))?;
        let inst = entry.value_mut();
        if let Some(index) = inst.active[note as usize].take() {
            self.backend.stop_note(inst.voices[index].handle, note)?;
        }
        Ok(())
    }

    /// Store a tuning offset for a note key and push the new bend to every
    /// voice currently sounding a matching note. With nothing sounding, the
    /// entry is stored and applied lazily at the next note-on.
    pub fn set_tuning(&self, id: InstrumentId, key: u8, offset_semitones: f64) -> Result<()> {
        let mut entry = self
            .instruments
            .get_mut(&id.0)
            .ok_or(Error::InstrumentNotFound(id.0))?;
        let inst = entry.value_mut();
        inst.tuning.check_key(key)?;

        let offset = bend::sanitize_offset(offset_semitones);
        inst.tuning.set(key, offset)?;

        let bend = bend::bend_value(offset);
        for note in 0..inst.active.len() {
            if let Some(index) = inst.active[note] {
                if inst.config.allocation.key_for(note as u8) == key {
                    Self::apply_bend(self.backend.as_ref(), &mut inst.voices[index], bend)?;
                }
            }
        }
        Ok(())
    }

    /// Release all voices and tuning entries for an instrument. Later
    /// operations on the same id fail with `InstrumentNotFound`.
    pub fn unload(&self, id: InstrumentId) -> Result<()> {
        let (_, inst) = self
            .instruments
            .remove(&id.0)
            .ok_or(Error::InstrumentNotFound(id.0))?;
        Self::release_all(self.backend.as_ref(), &inst.voices);
        debug!("unloaded instrument {}", id.0);
        Ok(())
    }

    /// Unload every instrument.
    pub fn dispose(&self) {
        let ids: Vec<u64> = self.instruments.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            let _ = self.unload(InstrumentId(id));
        }
    }

    /// Number of loaded instruments.
    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Handles of all loaded instruments.
    pub fn handles(&self) -> Vec<InstrumentId> {
        self.instruments
            .iter()
            .map(|entry| InstrumentId(*entry.key()))
            .collect()
    }

    /// Current bend value on one voice (for diagnostics and tests).
    pub fn voice_bend(&self, id: InstrumentId, channel: u8) -> Result<u16> {
        let entry = self
            .instruments
            .get(&id.0)
            .ok_or(Error::InstrumentNotFound(id.0))?;
        let inst = entry.value();
        let index = channel as usize;
        if index >= inst.voices.len() {
            return Err(Error::InvalidChannel {
                channel: channel as i64,
                voices: inst.voices.len(),
            });
        }
        Ok(inst.voices[index].bend)
    }

    /// Stored tuning offset for a key, if any.
    pub fn tuning_offset(&self, id: InstrumentId, key: u8) -> Result<Option<f64>> {
        let entry = self
            .instruments
            .get(&id.0)
            .ok_or(Error::InstrumentNotFound(id.0))?;
        Ok(entry.value().tuning.get(key))
    }

    /// The one code path through which bends reach the backend.
    fn apply_bend(backend: &dyn AudioBackend, voice: &mut Voice, bend: u16) -> Result<()> {
        backend.send_pitch_bend(voice.handle, bend)?;
        voice.bend = bend;
        Ok(())
    }

    fn release_all(backend: &dyn AudioBackend, voices: &[Voice]) {
        for voice in voices {
            backend.release_voice(voice.handle);
        }
    }

    fn check_note(note: u8) -> Result<()> {
        if note > 127 {
            return Err(Error::InvalidNote {
                key: note as i64,
                max: 127,
            });
        }
        Ok(())
    }

    fn check_velocity(velocity: u8) -> Result<()> {
        if velocity > 127 {
            return Err(Error::InvalidArguments(format!(
                "velocity {velocity} out of range (0..=127)"
            )));
        }
        Ok(())
    }
}
