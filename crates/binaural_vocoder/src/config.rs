//! Operating constants and the engine configuration.
//!
//! The physical constants are fixed: they describe the head model the interaural delays are derived from, and the
//! measurement set the direction table was built for.  Everything a host may reasonably want to vary lives in
//! [EngineConfig].
pub use binaural_vocoder_datasets::{HRIR_COUNT, HRIR_LENGTH};

/// Radius of the modelled head, in metres.
pub const HEAD_RADIUS: f64 = 0.07;

/// Speed of sound, in metres per second.
pub const SPEED_OF_SOUND: f64 = 343.0;

/// Fixed gain applied to both ears after the interaural delay, on top of the user's gain.
pub const ITD_OUTPUT_GAIN: f32 = 2.0;

/// Distance at which the phase vocoder leaves magnitudes untouched.  Closer sources are not amplified.
pub const MIN_DISTANCE: f32 = 1.0;

/// Upper end of the distance range the control surface is expected to produce.
pub const MAX_DISTANCE: f32 = 20.0;

/// Reverb wet level at [MAX_DISTANCE].  The wet level rises linearly from 0 at [MIN_DISTANCE].
pub const MAX_REVERB_WET_LEVEL: f32 = 0.1;

pub const DEFAULT_VOCODER_TRANSFORM_SIZE: usize = 512;
pub const DEFAULT_DELAY_LINE_SECONDS: f64 = 2.0;
pub const DEFAULT_WHISPER_SEED: u64 = 0x5eed_b10a;

/// Configuration fixed at construction time.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Size of the phase vocoder's transform, which is also its hop size and its latency in samples.
    ///
    /// Must be a power of two.
    pub vocoder_transform_size: usize,

    /// How much audio each interaural delay line holds.  Anything over a few milliseconds is enough for the head
    /// model, but the line is sized generously so that it can never be lapped.
    pub delay_line_seconds: f64,

    /// Seed for the generator behind whisperisation's random phases.
    pub whisper_seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            vocoder_transform_size: DEFAULT_VOCODER_TRANSFORM_SIZE,
            delay_line_seconds: DEFAULT_DELAY_LINE_SECONDS,
            whisper_seed: DEFAULT_WHISPER_SEED,
        }
    }
}
