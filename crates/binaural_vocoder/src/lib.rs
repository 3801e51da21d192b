//! A binaural renderer built around a phase vocoder.
//!
//! A mono or stereo signal is placed at an azimuth, elevation, and distance around the listener.  Direction comes from
//! blending the four measured head-related impulse responses around the source and from an interaural time delay;
//! distance scales the spectrum and, optionally, drives a reverb.  Along the way the phase vocoder can robotise or
//! whisperise the signal.
//!
//! Start at [BinauralEngine].
#[macro_use]
mod logging;

mod blender;
#[cfg(test)]
mod close_floats;
pub mod config;
mod controls;
mod convolution;
mod direction;
mod engine;
mod error;
mod fast_xoroshiro;
mod hrir_store;
mod is_audio_thread;
mod itd;
mod reverb;
mod vocoder;

pub use blender::{BlendedImpulseResponse, SpectralBlender};
pub use config::EngineConfig;
pub use controls::*;
pub use convolution::{Convolver, DirectConvolver};
pub use direction::{azimuth_to_degrees, select, select_degrees, DirectionQuad};
pub use engine::BinauralEngine;
pub use error::{DatasetError, Error, PrepareError, Result};
pub use hrir_store::{
    BuildSummary, FsResourceProvider, HrirResourceProvider, HrirStore, ImpulseResponse,
    MemoryResourceProvider,
};
pub use itd::{interaural_delays, InterauralDelayLines};
pub use reverb::{reverb_wet_level, Reverberator};
pub use vocoder::PhaseVocoder;
