//! The convolution stage that applies the blended impulse response.
//!
//! Real hosts bring their own partitioned convolution engine and plug it in through [Convolver].  [DirectConvolver]
//! evaluates the sum directly, which is fine for impulse responses of a few hundred samples.
use crate::blender::BlendedImpulseResponse;

/// A streaming stereo convolver.
///
/// The engine calls [Convolver::prepare] from `prepare`, then once per block [Convolver::load_impulse_response] followed
/// by [Convolver::process_replacing] for each ear.  Only `prepare` may allocate.
pub trait Convolver: Send {
    fn prepare(&mut self, sample_rate: f64, max_block_size: usize, ir_length: usize);

    /// Replace the impulse response.  Takes effect from the next processed sample.
    fn load_impulse_response(&mut self, impulse_response: &BlendedImpulseResponse, sample_rate: f64);

    /// Convolve `block` for ear `channel` (0 left, 1 right) in place.
    fn process_replacing(&mut self, channel: usize, block: &mut [f32]);

    /// Forget any buffered input.
    fn reset(&mut self) {}
}

#[derive(Clone, Debug, Default)]
struct DirectChannel {
    /// The impulse response, reversed.
    reversed: Vec<f32>,

    /// The last `ir_length - 1` input samples followed by the current block.
    window: Vec<f32>,
}

/// Convolution by directly evaluating the sum.
///
/// Complexity is `theta(M*N)` where `M` is the impulse length and `N` the block's length.
#[derive(Clone, Debug, Default)]
pub struct DirectConvolver {
    channels: [DirectChannel; 2],
    ir_length: usize,
    max_block_size: usize,
}

impl DirectConvolver {
    pub fn new() -> Self {
        Default::default()
    }

    fn history_len(&self) -> usize {
        self.ir_length.saturating_sub(1)
    }

    fn process_chunk(&mut self, channel: usize, block: &mut [f32]) {
        let history = self.history_len();
        let state = &mut self.channels[channel];
        let frames = block.len();

        state.window[history..history + frames].copy_from_slice(block);

        for (frame, out) in block.iter_mut().enumerate() {
            let input = &state.window[frame..frame + state.reversed.len()];
            // f32 is plenty for impulses this short.
            *out = input
                .iter()
                .zip(state.reversed.iter())
                .map(|(x, h)| x * h)
                .sum();
        }

        state.window.copy_within(frames..frames + history, 0);
    }
}

impl Convolver for DirectConvolver {
    fn prepare(&mut self, _sample_rate: f64, max_block_size: usize, ir_length: usize) {
        self.ir_length = ir_length.max(1);
        self.max_block_size = max_block_size.max(1);
        let window = self.history_len() + self.max_block_size;

        for c in self.channels.iter_mut() {
            c.reversed = vec![0.0; self.ir_length];
            c.window = vec![0.0; window];
        }
    }

    fn load_impulse_response(&mut self, impulse_response: &BlendedImpulseResponse, _sample_rate: f64) {
        for (ear, c) in self.channels.iter_mut().enumerate() {
            let source = impulse_response.channel(ear);
            c.reversed.fill(0.0);
            for (dest, src) in c.reversed.iter_mut().rev().zip(source.iter()) {
                *dest = *src;
            }
        }
    }

    fn process_replacing(&mut self, channel: usize, block: &mut [f32]) {
        if self.max_block_size == 0 {
            // Not prepared; behave as an empty impulse response.
            block.fill(0.0);
            return;
        }

        let max = self.max_block_size;
        for chunk in block.chunks_mut(max) {
            self.process_chunk(channel, chunk);
        }
    }

    fn reset(&mut self) {
        for c in self.channels.iter_mut() {
            c.window.fill(0.0);
        }
    }
}
