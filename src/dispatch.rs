//! Method-call dispatch.
//!
//! Maps named method calls with flat key-value arguments onto
//! [`VoiceRouter`] operations: `loadSoundfont`, `selectInstrument`,
//! `playNote`, `stopNote`, `tuneNotes`, `unloadSoundfont`, `dispose`.
//! All type and range validation happens here, before the router is
//! touched.

use crate::args::CallArgs;
use crate::backend::AudioBackend;
use crate::error::{Error, Result};
use crate::registry::{InstrumentConfig, InstrumentId, VoiceRouter};
use crate::voice::AllocationPolicy;
use std::sync::Arc;

/// Reply from a dispatched method call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Method with no return value.
    None,
    /// Newly assigned instrument id (`loadSoundfont`).
    InstrumentId(u64),
}

/// Thin dispatch layer in front of a [`VoiceRouter`].
pub struct Dispatcher {
    router: VoiceRouter,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        Self {
            router: VoiceRouter::new(backend),
        }
    }

    /// Direct access to the underlying router.
    pub fn router(&self) -> &VoiceRouter {
        &self.router
    }

    /// Handle one method call.
    pub fn handle(&self, method: &str, args: &CallArgs) -> Result<Reply> {
        match method {
            "loadSoundfont" => self.load_soundfont(args),
            "selectInstrument" => self.select_instrument(args),
            "playNote" => self.play_note(args),
            "stopNote" => self.stop_note(args),
            "tuneNotes" => self.tune_notes(args),
            "unloadSoundfont" => self.unload_soundfont(args),
            "dispose" => {
                self.router.dispose();
                Ok(Reply::None)
            }
            other => Err(Error::InvalidArguments(format!("unknown method '{other}'"))),
        }
    }

    fn load_soundfont(&self, args: &CallArgs) -> Result<Reply> {
        let path = require_str(args, "path")?;
        let bank = require_u32(args, "bank")?;
        let program = require_u32(args, "program")?;
        let allocation = optional_allocation(args)?;

        let mut config = InstrumentConfig::new(path)
            .bank_program(bank, program)
            .allocation(allocation);
        if let Some(value) = args.get("voices") {
            let voices = value.as_i64().ok_or_else(|| {
                Error::InvalidArguments("field 'voices' must be an integer".to_string())
            })?;
            if !(1..=128).contains(&voices) {
                return Err(Error::InvalidArguments(format!(
                    "field 'voices' out of range: {voices}"
                )));
            }
            config = config.voices(voices as usize);
        } else {
            config = config.voices(allocation.default_voices());
        }

        let id = self.router.load(config)?;
        Ok(Reply::InstrumentId(id.id()))
    }

    fn select_instrument(&self, args: &CallArgs) -> Result<Reply> {
        let id = require_instrument(args)?;
        let channel = optional_channel(args)?.unwrap_or(0);
        let bank = require_u32(args, "bank")?;
        let program = require_u32(args, "program")?;
        self.router.select_instrument(id, channel, bank, program)?;
        Ok(Reply::None)
    }

    fn play_note(&self, args: &CallArgs) -> Result<Reply> {
        let id = require_instrument(args)?;
        let note = require_note(args, "key")?;
        let velocity = require_velocity(args)?;
        let channel = optional_channel(args)?;
        self.router.play_note(id, note, velocity, channel)?;
        Ok(Reply::None)
    }

    fn stop_note(&self, args: &CallArgs) -> Result<Reply> {
        let id = require_instrument(args)?;
        let note = require_note(args, "key")?;
        // A supplied 'channel' is validated but not needed: the active-note
        // map remembers which voice sounds the note.
        let _ = optional_channel(args)?;
        self.router.stop_note(id, note)?;
        Ok(Reply::None)
    }

    fn tune_notes(&self, args: &CallArgs) -> Result<Reply> {
        let id = require_instrument(args)?;
        let key = require_note(args, "key")?;
        let tune = require_f64(args, "tune")?;
        self.router.set_tuning(id, key, tune)?;
        Ok(Reply::None)
    }

    fn unload_soundfont(&self, args: &CallArgs) -> Result<Reply> {
        let id = require_instrument(args)?;
        self.router.unload(id)?;
        Ok(Reply::None)
    }
}

fn missing(key: &str) -> Error {
    Error::InvalidArguments(format!("missing field '{key}'"))
}

fn require_i64(args: &CallArgs, key: &str) -> Result<i64> {
    args.get(key)
        .ok_or_else(|| missing(key))?
        .as_i64()
        .ok_or_else(|| Error::InvalidArguments(format!("field '{key}' must be an integer")))
}

fn require_u32(args: &CallArgs, key: &str) -> Result<u32> {
    let value = require_i64(args, key)?;
    u32::try_from(value)
        .map_err(|_| Error::InvalidArguments(format!("field '{key}' out of range: {value}")))
}

fn require_f64(args: &CallArgs, key: &str) -> Result<f64> {
    args.get(key)
        .ok_or_else(|| missing(key))?
        .as_f64()
        .ok_or_else(|| Error::InvalidArguments(format!("field '{key}' must be a number")))
}

fn require_str<'a>(args: &'a CallArgs, key: &str) -> Result<&'a str> {
    args.get(key)
        .ok_or_else(|| missing(key))?
        .as_str()
        .ok_or_else(|| Error::InvalidArguments(format!("field '{key}' must be a string")))
}

fn require_instrument(args: &CallArgs) -> Result<InstrumentId> {
    let id = require_i64(args, "instrumentId")?;
    if id < 1 {
        return Err(Error::InstrumentNotFound(id.max(0) as u64));
    }
    Ok(InstrumentId::new(id as u64))
}

fn require_note(args: &CallArgs, key: &str) -> Result<u8> {
    let value = require_i64(args, key)?;
    if !(0..=127).contains(&value) {
        return Err(Error::InvalidNote {
            key: value,
            max: 127,
        });
    }
    Ok(value as u8)
}

fn require_velocity(args: &CallArgs) -> Result<u8> {
    let value = require_i64(args, "velocity")?;
    if !(0..=127).contains(&value) {
        return Err(Error::InvalidArguments(format!(
            "field 'velocity' out of range: {value}"
        )));
    }
    Ok(value as u8)
}

fn optional_channel(args: &CallArgs) -> Result<Option<u8>> {
    match args.get("channel") {
        None => Ok(None),
        Some(value) => {
            let channel = value.as_i64().ok_or_else(|| {
                Error::InvalidArguments("field 'channel' must be an integer".to_string())
            })?;
            // Only well-formedness here; the registry checks the channel
            // against the instrument's actual voice count.
            let channel = u8::try_from(channel).map_err(|_| {
                Error::InvalidArguments(format!("field 'channel' out of range: {channel}"))
            })?;
            Ok(Some(channel))
        }
    }
}

fn optional_allocation(args: &CallArgs) -> Result<AllocationPolicy> {
    match args.get("allocation") {
        None => Ok(AllocationPolicy::FixedChannel),
        Some(value) => match value.as_str() {
            Some("channel") => Ok(AllocationPolicy::FixedChannel),
            Some("pitchClass") => Ok(AllocationPolicy::PitchClass),
            _ => Err(Error::InvalidArguments(
                "field 'allocation' must be \"channel\" or \"pitchClass\"".to_string(),
            )),
        },
    }
}
