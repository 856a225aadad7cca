//! # soundfont-voicer
//!
//! Voice routing and per-note microtuning for SoundFont samplers.
//!
//! The crate owns the bookkeeping a sampler host needs but an audio engine
//! does not provide: which synthesis voice plays which MIDI note, and how a
//! requested per-note tuning offset becomes a 14-bit pitch-bend value on
//! the right voice. Synthesis itself stays behind the [`AudioBackend`]
//! trait.
//!
//! ## Architecture
//!
//! - **error** - error kinds shared by every layer
//! - **bend** - canonical tuning-offset to pitch-bend conversion
//! - **backend** - contract with the external sound engine (+ test double)
//! - **voice** - allocation policies and per-voice state
//! - **tuning** - per-instrument tuning tables
//! - **registry** - [`VoiceRouter`], the arena owning all instrument state
//! - **args** / **dispatch** - flat key-value method-call surface
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use soundfont_voicer::{args, backend::MockBackend, Dispatcher, Reply};
//!
//! let dispatcher = Dispatcher::new(Arc::new(MockBackend::new()));
//!
//! let reply = dispatcher.handle("loadSoundfont", &args! {
//!     "path" => "piano.sf2",
//!     "bank" => 0,
//!     "program" => 0,
//!     "allocation" => "pitchClass",
//! })?;
//! let id = match reply {
//!     Reply::InstrumentId(id) => id as i64,
//!     _ => unreachable!(),
//! };
//!
//! dispatcher.handle("playNote", &args! {
//!     "instrumentId" => id, "key" => 60, "velocity" => 100,
//! })?;
//! dispatcher.handle("tuneNotes", &args! {
//!     "instrumentId" => id, "key" => 0, "tune" => 0.5,
//! })?;
//! dispatcher.handle("stopNote", &args! {
//!     "instrumentId" => id, "key" => 60,
//! })?;
//! # Ok::<(), soundfont_voicer::Error>(())
//! ```

pub mod args;
pub mod backend;
pub mod bend;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod tuning;
pub mod voice;

pub use args::{ArgValue, CallArgs};
pub use backend::{AudioBackend, VoiceHandle};
pub use dispatch::{Dispatcher, Reply};
pub use error::{Error, Result};
pub use registry::{InstrumentConfig, InstrumentId, VoiceRouter};
pub use tuning::TuningTable;
pub use voice::{AllocationPolicy, Voice};
