//! Combining the four HRIRs around a direction into one.
//!
//! The four impulse responses are transformed, multiplied bin by bin, and transformed back.  In the time domain this is
//! the circular convolution of all four, over a window of the next power of two at or above the impulse response
//! length.
use std::sync::Arc;

use rustfft::num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use binaural_vocoder_dsp::spectral::spectral_product4;

use crate::hrir_store::ImpulseResponse;

/// A blended impulse response for both ears.
#[derive(Clone, Debug, PartialEq)]
pub struct BlendedImpulseResponse {
    channels: [Vec<f32>; 2],
}

impl BlendedImpulseResponse {
    /// A silent response of `length` frames per ear.
    pub fn new(length: usize) -> Self {
        Self {
            channels: [vec![0.0; length], vec![0.0; length]],
        }
    }

    /// Length in frames.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, ear: usize) -> &[f32] {
        &self.channels[ear]
    }

    pub fn channel_mut(&mut self, ear: usize) -> &mut [f32] {
        &mut self.channels[ear]
    }
}

#[derive(derivative::Derivative)]
#[derivative(Debug)]
pub struct SpectralBlender {
    ir_length: usize,
    #[derivative(Debug = "ignore")]
    forward: Arc<dyn Fft<f64>>,
    #[derivative(Debug = "ignore")]
    inverse: Arc<dyn Fft<f64>>,
    #[derivative(Debug = "ignore")]
    spectra: [Vec<Complex64>; 4],
    #[derivative(Debug = "ignore")]
    product: Vec<Complex64>,
    #[derivative(Debug = "ignore")]
    scratch: Vec<Complex64>,
}

impl SpectralBlender {
    /// Plan transforms and allocate buffers for impulse responses of `ir_length` frames.
    pub fn new(ir_length: usize) -> SpectralBlender {
        let ir_length = ir_length.max(1);
        let transform_size = ir_length.next_power_of_two();

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(transform_size);
        let inverse = planner.plan_fft_inverse(transform_size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        let zeros = || vec![Complex64::default(); transform_size];
        SpectralBlender {
            ir_length,
            forward,
            inverse,
            spectra: [zeros(), zeros(), zeros(), zeros()],
            product: zeros(),
            scratch: vec![Complex64::default(); scratch_len],
        }
    }

    pub fn ir_length(&self) -> usize {
        self.ir_length
    }

    pub fn transform_size(&self) -> usize {
        self.product.len()
    }

    /// Blend channel `channel` of `irs`, given as `[lower left, upper left, lower right, upper right]`, into `out`.
    ///
    /// Impulse responses with fewer channels use their last one; empty ones make the result silent.  Writes
    /// `min(out.len(), ir_length)` frames and zeroes the rest of `out`.
    pub fn blend(&mut self, channel: usize, irs: [&ImpulseResponse; 4], out: &mut [f32]) {
        for (spectrum, ir) in self.spectra.iter_mut().zip(irs.iter()) {
            load_padded(spectrum, pick_channel(ir, channel));
            self.forward
                .process_with_scratch(&mut spectrum[..], &mut self.scratch[..]);
        }

        let scale = 1.0 / self.product.len() as f64;
        let [a, b, c, d] = &self.spectra;
        spectral_product4([&a[..], &b[..], &c[..], &d[..]], scale, &mut self.product[..]);

        self.inverse
            .process_with_scratch(&mut self.product[..], &mut self.scratch[..]);

        let frames = out.len().min(self.ir_length);
        for (o, p) in out[..frames].iter_mut().zip(self.product.iter()) {
            *o = p.re as f32;
        }
        out[frames..].fill(0.0);
    }

    /// Blend both ears at once: channel 0 into the left ear, channel 1 into the right.
    pub fn blend_stereo(&mut self, irs: [&ImpulseResponse; 4], out: &mut BlendedImpulseResponse) {
        for ear in 0..2 {
            self.blend(ear, irs, out.channel_mut(ear));
        }
    }
}

fn pick_channel(ir: &ImpulseResponse, channel: usize) -> &[f32] {
    match ir.channel_count() {
        0 => &[],
        n => ir.channel(channel.min(n - 1)),
    }
}

/// Copy `samples` into `dest` as real values, truncating or zero-padding to fit.
fn load_padded(dest: &mut [Complex64], samples: &[f32]) {
    let n = samples.len().min(dest.len());
    for (d, s) in dest[..n].iter_mut().zip(samples.iter()) {
        *d = Complex64::new(*s as f64, 0.0);
    }
    dest[n..].fill(Complex64::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::close_floats::close_floats32;

    fn impulse(len: usize, at: usize, amplitude: f32) -> ImpulseResponse {
        let mut samples = vec![0.0; len];
        samples[at] = amplitude;
        ImpulseResponse::from_channels(vec![samples])
    }

    #[test]
    fn test_unit_impulses_blend_to_unit_impulse() {
        let mut blender = SpectralBlender::new(256);
        assert_eq!(blender.transform_size(), 256);

        let ir = impulse(256, 0, 1.0);
        let mut out = vec![0.0; 256];
        blender.blend(0, [&ir, &ir, &ir, &ir], &mut out);

        close_floats32(out[0], 1.0, 1e-6);
        for s in &out[1..] {
            close_floats32(*s, 0.0, 1e-6);
        }
    }

    #[test]
    fn test_scaled_impulses_multiply() {
        let mut blender = SpectralBlender::new(64);
        let ir = impulse(64, 0, 0.5);
        let mut out = vec![0.0; 64];
        blender.blend(0, [&ir, &ir, &ir, &ir], &mut out);
        close_floats32(out[0], 0.0625, 1e-6);
        for s in &out[1..] {
            close_floats32(*s, 0.0, 1e-6);
        }
    }

    #[test]
    fn test_delays_add_and_wrap() {
        // Delays of 1, 2, 3 and 4 sum to 10, which wraps to 2 in an 8 point transform.
        let mut blender = SpectralBlender::new(8);
        let irs = [
            impulse(8, 1, 1.0),
            impulse(8, 2, 1.0),
            impulse(8, 3, 1.0),
            impulse(8, 4, 1.0),
        ];
        let mut out = vec![0.0; 8];
        blender.blend(0, [&irs[0], &irs[1], &irs[2], &irs[3]], &mut out);
        for (i, s) in out.iter().enumerate() {
            close_floats32(*s, if i == 2 { 1.0 } else { 0.0 }, 1e-6);
        }
    }

    #[test]
    fn test_matches_direct_circular_convolution() {
        let n = 16;
        let make = |k: usize| {
            ImpulseResponse::from_channels(vec![(0..n)
                .map(|i| ((i * (k + 3)) % 7) as f32 / 7.0 - 0.4)
                .collect()])
        };
        let irs = [make(0), make(1), make(2), make(3)];

        let mut expected = irs[0].channel(0).iter().map(|s| *s as f64).collect::<Vec<_>>();
        for ir in &irs[1..] {
            let mut next = vec![0.0f64; n];
            for (i, e) in expected.iter().enumerate() {
                for (j, h) in ir.channel(0).iter().enumerate() {
                    next[(i + j) % n] += e * *h as f64;
                }
            }
            expected = next;
        }

        let mut blender = SpectralBlender::new(n);
        let mut out = vec![0.0; n];
        blender.blend(0, [&irs[0], &irs[1], &irs[2], &irs[3]], &mut out);
        for (o, e) in out.iter().zip(expected.iter()) {
            close_floats32(*o, *e as f32, 1e-3);
        }
    }

    #[test]
    fn test_empty_ir_gives_silence() {
        let mut blender = SpectralBlender::new(32);
        let ir = impulse(32, 0, 1.0);
        let mut out = vec![1.0; 32];
        blender.blend(1, [&ir, ImpulseResponse::empty(), &ir, &ir], &mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_stereo_uses_each_ear_and_falls_back_to_last_channel() {
        let mut blender = SpectralBlender::new(8);
        let stereo = ImpulseResponse::from_channels(vec![
            vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ]);
        let mono = impulse(8, 0, 1.0);

        let mut out = BlendedImpulseResponse::new(8);
        blender.blend_stereo([&stereo, &mono, &mono, &mono], &mut out);
        close_floats32(out.channel(0)[0], 1.0, 1e-6);
        close_floats32(out.channel(1)[0], 0.0, 1e-6);
        close_floats32(out.channel(1)[1], 1.0, 1e-6);
    }

    #[test]
    fn test_output_length_handling() {
        // Non-power-of-two lengths round up, and longer inputs are truncated.
        let mut blender = SpectralBlender::new(200);
        assert_eq!(blender.transform_size(), 256);

        let long = impulse(300, 0, 1.0);
        let mut out = vec![9.0; 210];
        blender.blend(0, [&long, &long, &long, &long], &mut out);
        close_floats32(out[0], 1.0, 1e-6);
        assert!(out[200..].iter().all(|s| *s == 0.0));
    }
}
