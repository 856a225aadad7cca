//! Error types for soundfont-voicer.

use thiserror::Error;

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while routing notes and tuning.
///
/// Validation errors are always raised before any state changes; backend
/// errors are reported as-is, never retried.
#[derive(Debug, Error)]
pub enum Error {
    /// Unknown instrument handle (never loaded, or already unloaded).
    #[error("instrument {0} not found")]
    InstrumentNotFound(u64),

    /// Channel index outside the instrument's voice count.
    #[error("channel {channel} out of range (instrument has {voices} voices)")]
    InvalidChannel { channel: i64, voices: usize },

    /// Note or tuning key outside the valid range for the instrument.
    #[error("note key {key} out of range (0..={max})")]
    InvalidNote { key: i64, max: u8 },

    /// Missing, wrong-typed, or out-of-range dispatch argument.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Sound-bank or engine-start failure reported by the backend.
    #[error("backend load failed: {0}")]
    BackendLoadFailed(String),

    /// Note or pitch-bend delivery failure reported by the backend.
    #[error("backend operation failed: {0}")]
    BackendOperationFailed(String),
}
