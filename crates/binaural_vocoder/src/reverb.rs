//! Distance reverb.
//!
//! Far sources sound further away with some room added.  No reverberator ships with the engine; hosts plug one in
//! through [Reverberator] and the engine drives its wet level from distance.
use crate::config::{MAX_DISTANCE, MAX_REVERB_WET_LEVEL, MIN_DISTANCE};

pub trait Reverberator: Send {
    /// Called from `prepare`.  May allocate.
    fn prepare(&mut self, sample_rate: f64);

    /// Set the wet level, in `0..=1`.  Called once per block, before [Reverberator::process_stereo].
    fn set_wet_level(&mut self, wet_level: f32);

    /// Process a stereo block in place.
    fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]);

    fn reset(&mut self) {}
}

/// The wet level for a source at `distance` metres: 0 at [MIN_DISTANCE], rising linearly to [MAX_REVERB_WET_LEVEL] at
/// [MAX_DISTANCE], and held there beyond.
pub fn reverb_wet_level(distance: f32) -> f32 {
    let clamped = distance.clamp(MIN_DISTANCE, MAX_DISTANCE);
    MAX_REVERB_WET_LEVEL * (clamped - MIN_DISTANCE) / (MAX_DISTANCE - MIN_DISTANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::close_floats::close_floats32;

    #[test]
    fn test_wet_level_follows_distance() {
        assert_eq!(reverb_wet_level(1.0), 0.0);
        close_floats32(reverb_wet_level(20.0), 0.1, 1e-7);
        close_floats32(reverb_wet_level(10.5), 0.05, 1e-7);
        assert_eq!(reverb_wet_level(0.5), 0.0);
        close_floats32(reverb_wet_level(100.0), 0.1, 1e-7);
    }
}
