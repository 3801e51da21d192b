// Original xoroshiro license: Written in 2019 by David Blackman and Sebastiano Vigna (vigna@acm.org)
//
//To the extent possible under law, the author has dedicated all copyright and related and neighboring rights to this
// software to the public domain worldwide. This software is distributed without any warranty.
//
// See <http://creativecommons.org/publicdomain/zero/1.0/>.

/// A xoroshiro128++ generator running `N` independent streams side by side.
///
/// Whisperisation needs one random phase per bin per frame, a few hundred numbers at a time on the audio thread.
/// Running several streams lets the compiler interleave them.  Only what the vocoder needs is here: raw `u64`s and
/// phases in `[0, 2pi)`.
///
/// implements: https://xoshiro.di.unimi.it/xoroshiro128plusplus.c
#[derive(Clone, Debug)]
pub(crate) struct FastXoroshiro128PlusPlus<const N: usize> {
    s0: [u64; N],
    s1: [u64; N],
}

macro_rules! next {
    ($self:expr, $ind: expr) => {{
        let s0 = $self.s0[$ind];
        let mut s1 = $self.s1[$ind];

        let result: u64 = s0.wrapping_add(s1).rotate_left(17).wrapping_add(s0);
        s1 ^= s0;
        $self.s0[$ind] = s0.rotate_left(49) ^ s1 ^ (s1 << 21);
        $self.s1[$ind] = s1.rotate_left(28);
        result
    }};
}

/// `2^-53`: maps the top 53 bits of a `u64` onto `[0, 1)`.
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

impl<const N: usize> FastXoroshiro128PlusPlus<N> {
    pub(crate) fn new_seeded(seed: u64) -> Self {
        use rand::{RngCore, SeedableRng};
        use rand_xoshiro::SplitMix64;

        let mut sm64 = SplitMix64::seed_from_u64(seed);
        let mut s0: [u64; N] = [0; N];
        let mut s1: [u64; N] = [0; N];

        for i in 0..N {
            s0[i] = sm64.next_u64();
            s1[i] = sm64.next_u64();
        }
        Self { s0, s1 }
    }

    /// A single value from the first stream.
    #[cfg(test)]
    #[inline(always)]
    pub(crate) fn gen_u64(&mut self) -> u64 {
        next!(self, 0)
    }

    /// Fill a slice with random values, spreading consecutive elements over the streams.
    #[inline]
    pub(crate) fn gen_slice(&mut self, destination: &mut [u64]) {
        for chunk in destination.chunks_mut(N) {
            for (gen, d) in chunk.iter_mut().enumerate() {
                *d = next!(self, gen);
            }
        }
    }

    /// Fill `destination` with phases uniformly distributed over `[0, 2pi)`.
    ///
    /// `scratch` receives the raw values and must be at least as long as `destination`.  Neither is allocated here.
    pub(crate) fn gen_phases(&mut self, scratch: &mut [u64], destination: &mut [f64]) {
        let scratch = &mut scratch[..destination.len()];
        self.gen_slice(scratch);
        for (d, raw) in destination.iter_mut().zip(scratch.iter()) {
            *d = u64_to_phase(*raw);
        }
    }
}

#[inline(always)]
fn u64_to_phase(raw: u64) -> f64 {
    (raw >> 11) as f64 * UNIT_SCALE * std::f64::consts::TAU
}
