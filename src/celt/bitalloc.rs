//! Per-band bit allocation.
//!
//! Splits the bits left in the frame after side information (energy, flags)
//! has been coded across the active bands, shaped by the `alloc_trim` value
//! decoded per frame: trim below the neutral point (5) favors low-frequency
//! bands, trim above it favors high-frequency bands.

use crate::celt::mode::Mode;

/// Smallest number of bits worth spending PVQ pulses on; bands below this
/// are left unallocated and their shape is synthesized by noise-fill instead.
const MIN_BAND_BITS: u32 = 4;

/// One frame's bit allocation: bits per band, plus which bands get first
/// claim on any leftover bits in the final-energy pass.
pub(crate) struct Allocation {
    /// Bits assigned to each band, for one channel.
    pub(crate) bits: Vec<u32>,
    /// Per-channel bit budget this allocation was computed against (`bits`
    /// sums to at most this); callers use it to size the final-energy
    /// leftover-bit pool instead of the frame's un-split `total_bits`.
    pub(crate) per_channel_bits: u32,
    /// For each band, whether it gets priority for a leftover final-energy
    /// bit: set when rounding the band's ideal (fractional) bit share down
    /// lost at least half a bit.
    pub(crate) fine_priority: Vec<bool>,
}

/// Computes the per-band bit allocation for a frame with `total_bits`
/// available across `channels` channels and allocation trim `alloc_trim`
/// (0..=10, 5 neutral). For stereo (`channels == 2`), `total_bits` is split
/// evenly between the mid and side channels before being divided across
/// bands, since both channels are coded independently against the same
/// frame budget.
pub(crate) fn allocate_bits(
    mode: &Mode,
    lm: usize,
    total_bits: u32,
    channels: usize,
    alloc_trim: i32,
) -> Allocation {
    let nbands = mode.nbands();
    let per_channel_bits = if channels == 2 { total_bits / 2 } else { total_bits };

    let mut weights = vec![0f32; nbands];
    let center = (nbands as f32 - 1.0) / 2.0;
    for (b, weight) in weights.iter_mut().enumerate() {
        let width = mode.band_width(b, lm) as f32;
        let centered = b as f32 - center;
        let trim_factor = 1.0 + (alloc_trim as f32 - 5.0) * 0.05 * centered / nbands as f32;
        *weight = width * trim_factor.max(0.1);
    }

    let total_weight: f32 = weights.iter().sum();
    if total_weight <= 0.0 {
        return Allocation {
            bits: vec![0; nbands],
            per_channel_bits,
            fine_priority: vec![false; nbands],
        };
    }

    let ideal: Vec<f32> = weights
        .iter()
        .map(|w| (w / total_weight) * per_channel_bits as f32)
        .collect();
    let mut bits: Vec<u32> = ideal.iter().map(|&v| v as u32).collect();
    let fine_priority: Vec<bool> = ideal
        .iter()
        .zip(bits.iter())
        .map(|(&want, &got)| want - got as f32 >= 0.5)
        .collect();

    // Starve bands too narrow to be worth a PVQ pulse; their bits flow back
    // into the pool for the final-energy refinement pass.
    for b in bits.iter_mut() {
        if *b < MIN_BAND_BITS {
            *b = 0;
        }
    }

    Allocation {
        bits,
        per_channel_bits,
        fine_priority,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_allocation_does_not_exceed_total_by_much() {
        let mode = Mode::new(48000);
        let lm = 2;
        let total_bits = 4000;
        let alloc = allocate_bits(&mode, lm, total_bits, 1, 5);
        let sum: u32 = alloc.bits.iter().sum();
        // Rounding down each band can only lose bits, never gain them.
        assert!(sum <= total_bits);
    }

    #[test]
    fn test_low_trim_favors_low_bands() {
        let mode = Mode::new(48000);
        let lm = 2;
        let low_trim = allocate_bits(&mode, lm, 4000, 1, 0);
        let high_trim = allocate_bits(&mode, lm, 4000, 1, 10);

        let low_bands_low_trim: u32 = low_trim.bits[0..5].iter().sum();
        let low_bands_high_trim: u32 = high_trim.bits[0..5].iter().sum();
        assert!(low_bands_low_trim >= low_bands_high_trim);
    }

    #[test]
    fn test_stereo_halves_the_per_channel_budget() {
        let mode = Mode::new(48000);
        let lm = 2;
        let mono = allocate_bits(&mode, lm, 4000, 1, 5);
        let stereo = allocate_bits(&mode, lm, 4000, 2, 5);
        assert_eq!(stereo.per_channel_bits, mono.per_channel_bits / 2);
        let mono_sum: u32 = mono.bits.iter().sum();
        let stereo_sum: u32 = stereo.bits.iter().sum();
        assert!(stereo_sum <= mono_sum);
    }
}
