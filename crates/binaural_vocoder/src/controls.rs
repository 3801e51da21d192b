//! What the user controls, and how it gets from a UI thread to the audio thread.
//!
//! The audio thread never reads shared state mid-block.  It takes a [Controls] by value at the top of each block,
//! either built directly by the host or taken from a [ControlSurface] with [ControlSurface::snapshot].
use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};

use crate::config::MIN_DISTANCE;

/// What the phase vocoder does to the phase of each bin before resynthesis.
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Hash,
    derive_more::IsVariant,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(u8)]
pub enum EffectMode {
    /// Keep the analysed phase.  Apart from the distance gain, the signal comes out as it went in.
    #[default]
    PassThrough = 0,

    /// Zero every phase, which gives a buzzy, pitched, monotone voice at the frame rate.
    Robotisation = 1,

    /// Replace every phase with a random one, which removes pitch and leaves breath.
    Whisperisation = 2,
}

impl EffectMode {
    fn from_u8(value: u8) -> EffectMode {
        match value {
            1 => EffectMode::Robotisation,
            2 => EffectMode::Whisperisation,
            _ => EffectMode::PassThrough,
        }
    }
}

pub const DEFAULT_DISTANCE: f32 = 2.0;
pub const DEFAULT_GAIN: f32 = 1.0;
pub const MIN_ELEVATION: f64 = -90.0;
pub const MAX_ELEVATION: f64 = 90.0;

/// Everything the engine needs to know about the source for one block.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Controls {
    /// Radians in `(-pi, pi]`.  0 is straight ahead, positive values are to the listener's right.
    pub azimuth: f64,

    /// Degrees in `[-90, 90]`.
    pub elevation: f64,

    /// Metres, at least 1.
    pub distance: f32,

    pub effect_mode: EffectMode,

    /// Linear gain, nominally `0..=3`.
    pub gain: f32,

    /// When set, output is a copy of the input.
    pub bypass: bool,
}

impl Default for Controls {
    fn default() -> Self {
        Controls {
            azimuth: 0.0,
            elevation: 0.0,
            distance: DEFAULT_DISTANCE,
            effect_mode: EffectMode::PassThrough,
            gain: DEFAULT_GAIN,
            bypass: false,
        }
    }
}

/// Which fields [Controls::sanitized] had to change.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Corrections {
    pub azimuth: bool,
    pub elevation: bool,
    pub distance: bool,
    pub gain: bool,
}

impl Corrections {
    pub fn any(&self) -> bool {
        self.azimuth || self.elevation || self.distance || self.gain
    }
}

impl Controls {
    /// Bring every field into its valid range.
    ///
    /// - An azimuth outside `(-pi, pi]`, or not finite, becomes 0.  Exactly `-pi` is the same direction as `pi` and
    ///   becomes `pi`.
    /// - A non-finite elevation becomes 0; otherwise elevation is clamped to `[-90, 90]`.
    /// - A distance under 1 or not finite becomes 1.
    /// - A negative or non-finite gain becomes 0.
    ///
    /// Clamping elevation is not reported as a correction; anything else that changes is.
    pub fn sanitized(&self) -> (Controls, Corrections) {
        let mut out = *self;
        let mut corrections = Corrections::default();

        if self.azimuth == -PI {
            out.azimuth = PI;
        } else if !(self.azimuth > -PI && self.azimuth <= PI) {
            out.azimuth = 0.0;
            corrections.azimuth = true;
        }

        if !self.elevation.is_finite() {
            out.elevation = 0.0;
            corrections.elevation = true;
        } else {
            out.elevation = self.elevation.clamp(MIN_ELEVATION, MAX_ELEVATION);
        }

        if !(self.distance >= MIN_DISTANCE) || !self.distance.is_finite() {
            out.distance = MIN_DISTANCE;
            corrections.distance = true;
        }

        if !(self.gain >= 0.0) || !self.gain.is_finite() {
            out.gain = 0.0;
            corrections.gain = true;
        }

        (out, corrections)
    }
}

/// Controls shared between whoever edits them and the audio thread.
///
/// Each field is its own atomic, so reads never tear and writers never block.  Fields are independent: a snapshot taken
/// while a UI thread is moving both azimuth and elevation may see the new azimuth with the old elevation, which for a
/// moving source is one block of difference and inaudible.  The last writer wins.
#[derive(Debug)]
pub struct ControlSurface {
    azimuth: AtomicU64,
    elevation: AtomicU64,
    distance: AtomicU32,
    effect_mode: AtomicU8,
    gain: AtomicU32,
    bypass: AtomicBool,
}

impl Default for ControlSurface {
    fn default() -> Self {
        ControlSurface::new(Controls::default())
    }
}

impl ControlSurface {
    pub fn new(initial: Controls) -> ControlSurface {
        ControlSurface {
            azimuth: AtomicU64::new(initial.azimuth.to_bits()),
            elevation: AtomicU64::new(initial.elevation.to_bits()),
            distance: AtomicU32::new(initial.distance.to_bits()),
            effect_mode: AtomicU8::new(initial.effect_mode as u8),
            gain: AtomicU32::new(initial.gain.to_bits()),
            bypass: AtomicBool::new(initial.bypass),
        }
    }

    pub fn set_azimuth(&self, radians: f64) {
        self.azimuth.store(radians.to_bits(), Ordering::Relaxed);
    }

    pub fn set_elevation(&self, degrees: f64) {
        self.elevation.store(degrees.to_bits(), Ordering::Relaxed);
    }

    pub fn set_distance(&self, metres: f32) {
        self.distance.store(metres.to_bits(), Ordering::Relaxed);
    }

    pub fn set_effect_mode(&self, mode: EffectMode) {
        self.effect_mode.store(mode as u8, Ordering::Relaxed);
    }

    pub fn set_gain(&self, gain: f32) {
        self.gain.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn set_bypass(&self, bypass: bool) {
        self.bypass.store(bypass, Ordering::Relaxed);
    }

    /// Set every field at once.  Still not atomic as a whole.
    pub fn set(&self, controls: &Controls) {
        self.set_azimuth(controls.azimuth);
        self.set_elevation(controls.elevation);
        self.set_distance(controls.distance);
        self.set_effect_mode(controls.effect_mode);
        self.set_gain(controls.gain);
        self.set_bypass(controls.bypass);
    }

    /// Read every field.  Call once per block.
    pub fn snapshot(&self) -> Controls {
        Controls {
            azimuth: f64::from_bits(self.azimuth.load(Ordering::Relaxed)),
            elevation: f64::from_bits(self.elevation.load(Ordering::Relaxed)),
            distance: f32::from_bits(self.distance.load(Ordering::Relaxed)),
            effect_mode: EffectMode::from_u8(self.effect_mode.load(Ordering::Relaxed)),
            gain: f32::from_bits(self.gain.load(Ordering::Relaxed)),
            bypass: self.bypass.load(Ordering::Relaxed),
        }
    }
}
