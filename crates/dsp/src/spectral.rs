//! Helpers for working with the spectra of real signals.
//!
//! A length-`n` spectrum of a real signal is conjugate symmetric: bin `n - k` is the conjugate of bin `k`.  Everything
//! here computes bins `0..=n/2` and derives the rest, and assumes `n` is even (it is always a power of two in this
//! workspace).
use num::complex::Complex;
use num::Float;

/// Fill bins `n/2 + 1..n` from bins `1..n/2` so that the spectrum describes a real signal.
///
/// DC and Nyquist are their own mirrors; they keep only their real part.
pub fn mirror_conjugate<T: Float>(spectrum: &mut [Complex<T>]) {
    let n = spectrum.len();
    if n == 0 {
        return;
    }

    spectrum[0].im = T::zero();
    if n < 2 {
        return;
    }

    let half = n / 2;
    spectrum[half].im = T::zero();
    for k in 1..half {
        spectrum[n - k] = spectrum[k].conj();
    }
}

/// Multiply four spectra bin by bin into `out`, then scale the whole product by `scale`.
///
/// Only bins `0..=n/2` are multiplied; the upper half is rebuilt with [mirror_conjugate].  All slices must have the
/// same length.
pub fn spectral_product4<T: Float>(
    spectra: [&[Complex<T>]; 4],
    scale: T,
    out: &mut [Complex<T>],
) {
    let n = out.len();
    for s in spectra.iter() {
        assert_eq!(s.len(), n);
    }

    if n == 0 {
        return;
    }

    let [a, b, c, d] = spectra;
    for k in 0..=n / 2 {
        out[k] = (a[k] * b[k] * c[k] * d[k]).scale(scale);
    }

    mirror_conjugate(out);
}

/// The magnitude and phase of a bin, as `(magnitude, phase)`.
#[inline(always)]
pub fn to_polar<T: Float>(bin: Complex<T>) -> (T, T) {
    (bin.norm(), bin.arg())
}
