//! Implements the FFT used for the MDCT.

use std::f32::consts::PI;

use num_complex::Complex32;

/// A mixed-radix Fast Fourier Transform based up on the principle, "Keep It Simple, Stupid."
///
/// Works for any composite length by recursively factoring it (smallest factor
/// first, largest prime factor falls back to a direct sum) and combining
/// sub-transforms with twiddle factors: the generalized Cooley-Tukey
/// decomposition, in a plain recursive form rather than an iterative
/// butterfly network.
pub(crate) struct KissFft {
    n: usize,
}

impl KissFft {
    pub(crate) fn new(n: usize) -> Self {
        Self { n }
    }

    /// Forward transform (`X[k] = sum_n x[n] * e^(-2*pi*i*n*k/N)`), unscaled.
    pub(crate) fn forward_unscaled(&self, input: &[Complex32]) -> Vec<Complex32> {
        debug_assert_eq!(input.len(), self.n);
        transform(input, false)
    }

    /// Inverse-kernel transform (`x[n] = sum_k X[k] * e^(2*pi*i*n*k/N)`), unscaled
    /// (the caller divides by `N` for a normalized inverse).
    pub(crate) fn inverse_unscaled(&self, input: &[Complex32]) -> Vec<Complex32> {
        debug_assert_eq!(input.len(), self.n);
        transform(input, true)
    }

    /// Normalized inverse transform (divides by `N`).
    pub(crate) fn inverse(&self, input: &[Complex32]) -> Vec<Complex32> {
        let scale = 1.0 / self.n as f32;
        self.inverse_unscaled(input)
            .into_iter()
            .map(|c| c * scale)
            .collect()
    }
}

fn smallest_factor(n: usize) -> usize {
    if n % 4 == 0 {
        4
    } else if n % 2 == 0 {
        2
    } else {
        let mut p = 3;
        while p * p <= n {
            if n % p == 0 {
                return p;
            }
            p += 2;
        }
        n
    }
}

fn naive_dft(x: &[Complex32], inverse: bool) -> Vec<Complex32> {
    let n = x.len();
    let sign = if inverse { 1.0 } else { -1.0 };
    (0..n)
        .map(|k| {
            let mut sum = Complex32::new(0.0, 0.0);
            for (i, &xi) in x.iter().enumerate() {
                let angle = sign * 2.0 * PI * (i as f32) * (k as f32) / n as f32;
                sum += xi * Complex32::new(angle.cos(), angle.sin());
            }
            sum
        })
        .collect()
}

fn transform(x: &[Complex32], inverse: bool) -> Vec<Complex32> {
    let n = x.len();
    if n <= 1 {
        return x.to_vec();
    }

    let n1 = smallest_factor(n);
    if n1 == n {
        // n is prime (or too small to factor usefully): fall back to a direct sum.
        return naive_dft(x, inverse);
    }
    let n2 = n / n1;
    let sign = if inverse { 1.0 } else { -1.0 };

    // Stage 1: n1 independent sub-transforms of size n2.
    let mut stage1 = vec![Complex32::new(0.0, 0.0); n];
    for r in 0..n1 {
        let sub: Vec<Complex32> = (0..n2).map(|i| x[r + n1 * i]).collect();
        let sub_out = transform(&sub, inverse);
        stage1[r * n2..r * n2 + n2].copy_from_slice(&sub_out);
    }

    // Stage 2: twiddle, then n2 independent sub-transforms of size n1.
    let mut out = vec![Complex32::new(0.0, 0.0); n];
    for k2 in 0..n2 {
        let twiddled: Vec<Complex32> = (0..n1)
            .map(|r| {
                let angle = sign * 2.0 * PI * (r as f32) * (k2 as f32) / n as f32;
                stage1[r * n2 + k2] * Complex32::new(angle.cos(), angle.sin())
            })
            .collect();
        let combined = transform(&twiddled, inverse);
        for k1 in 0..n1 {
            out[k2 + n2 * k1] = combined[k1];
        }
    }

    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_matches_naive_dft() {
        for &n in &[30_usize, 60, 120, 240] {
            let input: Vec<Complex32> = (0..n)
                .map(|i| Complex32::new((i as f32 * 0.37).sin(), (i as f32 * 0.13).cos()))
                .collect();
            let fft = KissFft::new(n);
            let got = fft.forward_unscaled(&input);
            let want = naive_dft(&input, false);
            for (g, w) in got.iter().zip(want.iter()) {
                assert!((g - w).norm() < 1e-1, "{:?} vs {:?}", g, w);
            }
        }
    }

    #[test]
    fn test_forward_inverse_round_trip() {
        let n = 120;
        let input: Vec<Complex32> = (0..n)
            .map(|i| Complex32::new((i as f32 * 0.05).sin(), 0.0))
            .collect();
        let fft = KissFft::new(n);
        let spectrum = fft.forward_unscaled(&input);
        let back = fft.inverse(&spectrum);
        for (a, b) in input.iter().zip(back.iter()) {
            assert!((a - b).norm() < 1e-1, "{:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn test_prime_length() {
        let n = 31;
        let input: Vec<Complex32> = (0..n).map(|i| Complex32::new(i as f32, 0.0)).collect();
        let fft = KissFft::new(n);
        let spectrum = fft.forward_unscaled(&input);
        let back = fft.inverse(&spectrum);
        for (a, b) in input.iter().zip(back.iter()) {
            assert!((a - b).norm() < 1e-1);
        }
    }
}
