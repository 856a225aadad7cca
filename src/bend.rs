//! Pitch-bend conversion.
//!
//! Maps a per-note tuning offset (in semitones) onto the 14-bit MIDI
//! pitch-bend range. This is the single place bend math lives; both
//! stored-tuning playback and live retuning go through [`bend_value`].

use tracing::warn;

/// Maximum 14-bit pitch-bend value.
pub const BEND_MAX: u16 = 16383;

/// Center position (no bend).
pub const BEND_CENTER: u16 = 8192;

/// Supported bend range in semitones (hardware contract: ±2).
pub const BEND_RANGE_SEMITONES: f64 = 2.0;

/// Sanitize a requested tuning offset.
///
/// Non-finite offsets are treated as no bend and logged as a recoverable
/// input anomaly. Finite offsets are clamped to ±2 semitones.
pub fn sanitize_offset(offset: f64) -> f64 {
    if !offset.is_finite() {
        warn!("non-finite tuning offset {offset}, treating as no bend");
        return 0.0;
    }
    offset.clamp(-BEND_RANGE_SEMITONES, BEND_RANGE_SEMITONES)
}

/// Convert a tuning offset in semitones to a 14-bit pitch-bend value.
///
/// `-2.0` maps to 0, `0.0` to 8192 (center), `+2.0` to 16383. Offsets
/// outside the supported range bend as far as the range allows; non-finite
/// offsets fall back to center.
pub fn bend_value(offset: f64) -> u16 {
    let clamped = sanitize_offset(offset);
    let normalized = (clamped + BEND_RANGE_SEMITONES) / (2.0 * BEND_RANGE_SEMITONES);
    let bend = (normalized * BEND_MAX as f64).round();
    bend.clamp(0.0, BEND_MAX as f64) as u16
}
