//! The phase vocoder.
//!
//! Each channel is cut into frames of `T` samples with a rectangular window and a hop of `T`, so frames neither
//! overlap nor leave gaps.  Every frame is transformed, has its magnitudes scaled for distance and its phases replaced
//! according to the [EffectMode], and is transformed back and added into an output ring twice the frame length.
//!
//! The output write cursor starts one hop ahead of the read cursor.  A frame completes on its last input sample and is
//! written just past the sample being read, so output is the input delayed by exactly `T` samples, and the first `T`
//! samples out are silence.
use std::num::NonZeroUsize;
use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use binaural_vocoder_dsp::spectral::{mirror_conjugate, to_polar};
use binaural_vocoder_dsp::CircularBuffer;

use crate::config::MIN_DISTANCE;
use crate::controls::EffectMode;
use crate::error::PrepareError;
use crate::fast_xoroshiro::FastXoroshiro128PlusPlus;

#[derive(Clone, Debug)]
struct ChannelState {
    input: CircularBuffer<f32>,
    output: CircularBuffer<f32>,
    input_write: usize,
    output_read: usize,
    output_write: usize,
    /// Samples since the last frame was processed.
    hop_counter: usize,
}

impl ChannelState {
    fn new(transform_size: NonZeroUsize) -> ChannelState {
        let mut state = ChannelState {
            input: CircularBuffer::new(transform_size),
            output: CircularBuffer::new(transform_size.saturating_add(transform_size.get())),
            input_write: 0,
            output_read: 0,
            output_write: 0,
            hop_counter: 0,
        };
        state.reset();
        state
    }

    fn reset(&mut self) {
        self.input.clear();
        self.output.clear();
        self.input_write = 0;
        self.output_read = 0;
        self.output_write = self.input.len();
        self.hop_counter = 0;
    }
}

#[derive(derivative::Derivative)]
#[derivative(Debug)]
pub struct PhaseVocoder {
    transform_size: usize,
    #[derivative(Debug = "ignore")]
    forward: Arc<dyn Fft<f64>>,
    #[derivative(Debug = "ignore")]
    inverse: Arc<dyn Fft<f64>>,
    #[derivative(Debug = "ignore")]
    channels: Vec<ChannelState>,
    #[derivative(Debug = "ignore")]
    frame: Vec<Complex64>,
    #[derivative(Debug = "ignore")]
    scratch: Vec<Complex64>,
    random: FastXoroshiro128PlusPlus<4>,
    #[derivative(Debug = "ignore")]
    random_scratch: Vec<u64>,
    #[derivative(Debug = "ignore")]
    phases: Vec<f64>,
}

impl PhaseVocoder {
    /// Allocate a vocoder for `channels` channels.
    ///
    /// `transform_size` must be a power of two.  `seed` drives the random phases of whisperisation.
    pub fn new(transform_size: usize, channels: usize, seed: u64) -> Result<PhaseVocoder, PrepareError> {
        let size = NonZeroUsize::new(transform_size)
            .filter(|s| s.is_power_of_two() && s.get() >= 2)
            .ok_or(PrepareError::InvalidTransformSize(transform_size))?;

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(transform_size);
        let inverse = planner.plan_fft_inverse(transform_size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());
        let bins = transform_size / 2 + 1;

        Ok(PhaseVocoder {
            transform_size,
            forward,
            inverse,
            channels: (0..channels).map(|_| ChannelState::new(size)).collect(),
            frame: vec![Complex64::default(); transform_size],
            scratch: vec![Complex64::default(); scratch_len],
            random: FastXoroshiro128PlusPlus::new_seeded(seed),
            random_scratch: vec![0; bins],
            phases: vec![0.0; bins],
        })
    }

    pub fn transform_size(&self) -> usize {
        self.transform_size
    }

    /// The delay between a sample going in and coming out, in samples.
    pub fn latency(&self) -> usize {
        self.transform_size
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Forget all buffered audio, as if freshly constructed.  The random generator is not reseeded.
    pub fn reset(&mut self) {
        for c in self.channels.iter_mut() {
            c.reset();
        }
    }

    /// Run `block` through channel `channel` in place.
    ///
    /// Magnitudes are scaled by `1 / distance`; distances under 1 count as 1.
    pub fn process(&mut self, channel: usize, block: &mut [f32], distance: f32, mode: EffectMode) {
        let magnitude_scale = 1.0 / distance.max(MIN_DISTANCE) as f64;

        for sample in block.iter_mut() {
            let state = &mut self.channels[channel];

            let out = state.output.take(state.output_read);
            state.output_read = state.output.advance(state.output_read, 1);

            state.input.write(state.input_write, *sample);
            state.input_write = state.input.advance(state.input_write, 1);

            state.hop_counter += 1;
            if state.hop_counter == self.transform_size {
                state.hop_counter = 0;
                self.process_frame(channel, magnitude_scale, mode);
            }

            *sample = out;
        }
    }

    fn process_frame(&mut self, channel: usize, magnitude_scale: f64, mode: EffectMode) {
        let state = &mut self.channels[channel];
        let n = self.transform_size;

        // The input ring is exactly one frame long and its write cursor sits on the oldest sample.
        let mut position = state.input_write;
        for bin in self.frame.iter_mut() {
            *bin = Complex64::new(state.input.read(position) as f64, 0.0);
            position += 1;
        }

        self.forward
            .process_with_scratch(&mut self.frame[..], &mut self.scratch[..]);

        let bins = n / 2 + 1;
        if mode.is_whisperisation() {
            self.random
                .gen_phases(&mut self.random_scratch[..], &mut self.phases[..bins]);
        }

        for (k, bin) in self.frame[..bins].iter_mut().enumerate() {
            let (magnitude, analysed) = to_polar(*bin);
            let phase = match mode {
                EffectMode::PassThrough => analysed,
                EffectMode::Robotisation => 0.0,
                EffectMode::Whisperisation => self.phases[k],
            };
            *bin = Complex64::from_polar(magnitude * magnitude_scale, phase);
        }
        mirror_conjugate(&mut self.frame[..]);

        self.inverse
            .process_with_scratch(&mut self.frame[..], &mut self.scratch[..]);

        let normalize = 1.0 / n as f64;
        state.output.accumulate(
            state.output_write,
            self.frame.iter().map(|c| (c.re * normalize) as f32),
        );
        state.output_write = state.output.advance(state.output_write, n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::close_floats::{close_floats32, close_floats64};

    const T: usize = 64;

    fn vocoder(channels: usize) -> PhaseVocoder {
        PhaseVocoder::new(T, channels, 5).unwrap()
    }

    fn sine(len: usize, frequency: f64) -> Vec<f32> {
        (0..len)
            .map(|i| (i as f64 * frequency * std::f64::consts::TAU / T as f64).sin() as f32)
            .collect()
    }

    fn spectrum(frame: &[f32]) -> Vec<Complex64> {
        let mut buf = frame
            .iter()
            .map(|s| Complex64::new(*s as f64, 0.0))
            .collect::<Vec<_>>();
        FftPlanner::<f64>::new()
            .plan_fft_forward(buf.len())
            .process(&mut buf);
        buf
    }

    #[test]
    fn test_rejects_bad_sizes() {
        for bad in [0, 1, 3, 500] {
            assert_eq!(
                PhaseVocoder::new(bad, 2, 0).unwrap_err(),
                PrepareError::InvalidTransformSize(bad)
            );
        }
        assert_eq!(vocoder(2).latency(), T);
    }

    #[test]
    fn test_pass_through_delays_by_exactly_one_frame() {
        let mut v = vocoder(1);
        let input = sine(T * 6, 3.7);
        let mut block = input.clone();

        // Process in awkwardly sized blocks to make sure state carries over.
        for chunk in block.chunks_mut(37) {
            v.process(0, chunk, 2.0, EffectMode::PassThrough);
        }

        for s in &block[..T] {
            assert_eq!(*s, 0.0);
        }
        for (out, inp) in block[T..].iter().zip(input.iter()) {
            close_floats32(*out, inp * 0.5, 1e-5);
        }
    }

    #[test]
    fn test_impulse_comes_out_after_latency() {
        let mut v = vocoder(1);
        let mut block = vec![0.0f32; T * 3];
        block[0] = 1.0;
        v.process(0, &mut block, 1.0, EffectMode::PassThrough);

        for (i, s) in block.iter().enumerate() {
            close_floats32(*s, if i == T { 1.0 } else { 0.0 }, 1e-6);
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut v = vocoder(2);
        let mut left = sine(T * 2, 2.0);
        let mut right = vec![0.0f32; T * 2];
        v.process(0, &mut left, 1.0, EffectMode::PassThrough);
        v.process(1, &mut right, 1.0, EffectMode::PassThrough);
        assert!(right.iter().all(|s| *s == 0.0));
        assert!(left[T..].iter().any(|s| *s != 0.0));
    }

    /// Feed one frame of `input` then a frame of silence, and return the output frame.
    fn one_frame(mode: EffectMode, input: &[f32], distance: f32) -> Vec<f32> {
        let mut v = vocoder(1);
        let mut block = input.to_vec();
        block.resize(T * 2, 0.0);
        v.process(0, &mut block, distance, mode);
        block[T..].to_vec()
    }

    fn test_signal() -> Vec<f32> {
        (0..T)
            .map(|i| {
                let x = i as f64;
                ((x * 0.3).sin() + 0.5 * (x * 1.7).cos() + 0.1) as f32
            })
            .collect()
    }

    #[test]
    fn test_robotisation_keeps_magnitudes_and_zeroes_phases() {
        let input = test_signal();
        let output = one_frame(EffectMode::Robotisation, &input, 2.0);

        let want = spectrum(&input);
        let got = spectrum(&output);
        for k in 0..T {
            close_floats64(got[k].re, want[k].norm() * 0.5, 1e-3);
            close_floats64(got[k].im, 0.0, 1e-3);
        }
    }

    #[test]
    fn test_whisperisation_keeps_magnitudes_and_randomizes_phases() {
        let input = test_signal();
        let output = one_frame(EffectMode::Whisperisation, &input, 1.0);
        let robot = one_frame(EffectMode::Robotisation, &input, 1.0);
        assert_ne!(output, robot);

        let want = spectrum(&input);
        let got = spectrum(&output);
        // DC and Nyquist can't carry a phase, so only the interior bins keep their magnitude exactly.
        for k in 1..T / 2 {
            close_floats64(got[k].norm(), want[k].norm(), 1e-3);
        }

        // Same seed, same output.
        assert_eq!(output, one_frame(EffectMode::Whisperisation, &input, 1.0));
    }

    #[test]
    fn test_reset_clears_pending_output() {
        let mut v = vocoder(1);
        let mut block = vec![1.0f32; T];
        v.process(0, &mut block, 1.0, EffectMode::PassThrough);
        v.reset();

        let mut silence = vec![0.0f32; T * 2];
        v.process(0, &mut silence, 1.0, EffectMode::PassThrough);
        assert!(silence.iter().all(|s| *s == 0.0));
    }
}
