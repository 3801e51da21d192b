//! Interaural time difference.
//!
//! Sound from the side reaches the near ear first.  The head is modelled as a sphere of radius [HEAD_RADIUS]: with
//! `phi` the angle of the source off the median plane, folded so that front and back mirror each other, the leading
//! ear is delayed by `r * (1 - cos phi) / c` and the trailing ear by `r * (phi + sin phi) / c`.  Both are 0 straight
//! ahead and straight behind, and both are continuous everywhere, including across the sides at `+-pi/2`.
use std::f64::consts::{FRAC_PI_2, PI};
use std::num::NonZeroUsize;

use binaural_vocoder_dsp::CircularBuffer;

use crate::config::{HEAD_RADIUS, ITD_OUTPUT_GAIN, SPEED_OF_SOUND};
use crate::error::PrepareError;

/// Per-ear delays in seconds, as `(left, right)`, for an azimuth in radians.
///
/// Positive azimuths are to the right, so the right ear leads.  Azimuths outside `(-pi, pi]`, other than exactly `-pi`,
/// are treated as 0.
pub fn interaural_delays(azimuth: f64) -> (f64, f64) {
    if !(-PI..=PI).contains(&azimuth) {
        return (0.0, 0.0);
    }

    let off_axis = azimuth.abs();
    let phi = if off_axis <= FRAC_PI_2 {
        off_axis
    } else {
        PI - off_axis
    };

    let leading = HEAD_RADIUS * (1.0 - phi.cos()) / SPEED_OF_SOUND;
    let trailing = HEAD_RADIUS * (phi + phi.sin()) / SPEED_OF_SOUND;

    if azimuth >= 0.0 {
        (trailing, leading)
    } else {
        (leading, trailing)
    }
}

/// A pair of delay lines, one per ear, fed from one write cursor.
#[derive(Clone, Debug)]
pub struct InterauralDelayLines {
    lines: [CircularBuffer<f32>; 2],
    write_position: usize,
    sample_rate: f64,
}

impl InterauralDelayLines {
    /// Allocate lines holding `seconds` of audio each at `sample_rate`, and at least one sample.
    pub fn new(sample_rate: f64, seconds: f64) -> Result<InterauralDelayLines, PrepareError> {
        if !(seconds.is_finite() && seconds > 0.0) {
            return Err(PrepareError::InvalidDelayLineLength(seconds));
        }

        let samples = (seconds * sample_rate) as usize;
        let length = NonZeroUsize::new(samples).unwrap_or(NonZeroUsize::MIN);
        Ok(InterauralDelayLines {
            lines: [CircularBuffer::new(length), CircularBuffer::new(length)],
            write_position: 0,
            sample_rate,
        })
    }

    pub fn len(&self) -> usize {
        self.lines[0].len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn clear(&mut self) {
        for l in self.lines.iter_mut() {
            l.clear();
        }
        self.write_position = 0;
    }

    /// Convert a delay in seconds to whole samples, clamped to what the lines can hold.
    pub fn delay_in_samples(&self, seconds: f64) -> usize {
        let samples = (seconds * self.sample_rate).round();
        if !(samples >= 0.0) {
            return 0;
        }
        (samples as usize).min(self.len() - 1)
    }

    /// Delay `left` and `right` in place for a source at `azimuth`, then apply the fixed output gain and `gain`.
    ///
    /// The delays are computed once for the whole block.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32], azimuth: f64, gain: f32) {
        let (left_delay, right_delay) = interaural_delays(azimuth);
        let delays = [
            self.delay_in_samples(left_delay),
            self.delay_in_samples(right_delay),
        ];
        let total_gain = ITD_OUTPUT_GAIN * gain;

        let [left_line, right_line] = &mut self.lines;
        let mut write = self.write_position;
        let mut left_read = left_line.behind(write, delays[0]);
        let mut right_read = right_line.behind(write, delays[1]);

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            left_line.write(write, *l);
            right_line.write(write, *r);

            *l = left_line.read(left_read) * total_gain;
            *r = right_line.read(right_read) * total_gain;

            write = left_line.advance(write, 1);
            left_read = left_line.advance(left_read, 1);
            right_read = right_line.advance(right_read, 1);
        }

        self.write_position = write;
    }
}
