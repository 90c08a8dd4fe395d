//! Implements the modified discrete cosine transform.

use std::f32::consts::PI;

use num_complex::Complex32;

use crate::celt::kiss_fft::KissFft;

/// This is a simple MDCT implementation that uses a same-size complex FFT
/// to do most of the work. It should be relatively straightforward to
/// plug in pretty much any FFT here.
///
/// This replaces the Vorbis FFT (and uses the exact same API), which
/// was a bit too messy and that was ending up duplicating code
/// (might as well use the same FFT everywhere).
///
/// The algorithm is similar to (and inspired from) Fabrice Bellard's
/// MDCT implementation in FFMPEG, but has differences in signs, ordering
/// and scaling in many places.
pub(crate) struct Mdct {
    n: usize,
    fft: KissFft,
}

impl Mdct {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            n,
            fft: KissFft::new(n),
        }
    }

    /// Forward transform. `input` holds `2*n` windowed time-domain samples;
    /// returns `n` frequency-domain coefficients.
    pub(crate) fn forward(&self, input: &[f32]) -> Vec<f32> {
        let n = self.n;
        debug_assert_eq!(input.len(), 2 * n);

        // Fold the 2N-sample window into an N-point complex sequence.
        let z: Vec<Complex32> = (0..n)
            .map(|i| {
                let angle = PI * i as f32 / n as f32;
                let diff = input[i] - input[i + n];
                Complex32::new(diff * angle.cos(), diff * angle.sin())
            })
            .collect();

        // Z[k] = sum_n z[n] * e^{+j*2*pi*n*k/N}, via conjugate-forward-conjugate.
        let conj_z: Vec<Complex32> = z.iter().map(|c| c.conj()).collect();
        let big_z: Vec<Complex32> = self
            .fft
            .forward_unscaled(&conj_z)
            .iter()
            .map(|c| c.conj())
            .collect();

        let n0 = n as f32 / 4.0 + 0.5;
        (0..n)
            .map(|k| {
                let phase = (2.0 * PI / n as f32) * n0 * (k as f32 + 0.5);
                big_z[k].re * phase.cos() - big_z[k].im * phase.sin()
            })
            .collect()
    }

    /// Inverse transform. `input` holds `n` frequency-domain coefficients; returns
    /// `2*n` time-domain samples ready for windowing and overlap-add.
    pub(crate) fn backward(&self, input: &[f32]) -> Vec<f32> {
        let n = self.n;
        debug_assert_eq!(input.len(), n);

        let n0 = n as f32 / 4.0 + 0.5;
        let b: Vec<Complex32> = (0..n)
            .map(|k| {
                let phase = (2.0 * PI / n as f32) * k as f32 * n0;
                Complex32::new(input[k] * phase.cos(), input[k] * phase.sin())
            })
            .collect();

        // Wn[m] = sum_k b[k] * e^{+j*2*pi*k*m/N}: an unnormalized inverse FFT,
        // periodic in m with period N.
        let wn = self.fft.inverse_unscaled(&b);

        (0..2 * n)
            .map(|i| {
                let phase = (PI / n as f32) * (i as f32 + n0);
                let w = wn[i % n];
                w.re * phase.cos() - w.im * phase.sin()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_round_trip_is_finite_and_nonzero() {
        let n = 120;
        let mdct = Mdct::new(n);
        let input: Vec<f32> = (0..2 * n).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();

        let spectrum = mdct.forward(&input);
        assert_eq!(spectrum.len(), n);

        let back = mdct.backward(&spectrum);
        assert_eq!(back.len(), 2 * n);

        // TDAC only cancels aliasing once overlap-added against an adjacent
        // frame, so we only check the transform doesn't blow up or collapse
        // to zero for a non-trivial input.
        let energy: f32 = back.iter().map(|v| v * v).sum();
        assert!(energy > 0.0);
        assert!(energy.is_finite());
    }

    #[test]
    fn test_dc_input_concentrates_in_low_bins() {
        let n = 120;
        let mdct = Mdct::new(n);
        let input = vec![1.0_f32; 2 * n];
        let spectrum = mdct.forward(&input);

        let low_energy: f32 = spectrum[0..4].iter().map(|v| v * v).sum();
        let high_energy: f32 = spectrum[n - 4..n].iter().map(|v| v * v).sum();
        assert!(low_energy > high_energy);
    }
}
