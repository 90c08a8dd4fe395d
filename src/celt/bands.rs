//! Per-band energy coding: coarse (inter/intra-predicted, Laplace-coded), fine
//! (direct raw bits), and final (leftover-bit) refinement passes.
//!
//! Energies are tracked as log2 values per band. The coarse pass predicts each
//! band's energy from the previous frame (inter) or the previous band in the
//! same frame (intra) and Laplace-codes the residual; the fine and final
//! passes spend any bits the allocator set aside refining that estimate with
//! uniformly-quantized raw bits.

use crate::celt::mode::Mode;
use crate::range_coder::{RangeDecoder, RangeEncoder};

/// Inter/intra energy-prediction coefficients.
struct PredCoef {
    alpha: f32,
    beta: f32,
}

fn pred_coef(transient: bool, intra: bool) -> PredCoef {
    if intra {
        PredCoef {
            alpha: 0.0,
            beta: 0.15,
        }
    } else if transient {
        PredCoef {
            alpha: 0.7273,
            beta: 0.3237,
        }
    } else {
        PredCoef {
            alpha: 0.8000,
            beta: 0.1953,
        }
    }
}

/// Laplace decay (Q14) and zero-frequency (out of 32768) for `band`,
/// decreasing with frequency: low bands vary more between frames and need a
/// wider, flatter distribution, high bands are steadier and code tighter.
fn laplace_params(band: usize, nbands: usize) -> (u32, u32) {
    let t = band as f32 / (nbands - 1) as f32;
    let decay = (14000.0 - 6000.0 * t) as u32;
    let fs0 = (3000.0 - 1500.0 * t) as u32;
    (fs0, decay)
}

/// Decodes the coarse per-band log2 energies for one channel of one frame.
///
/// `prev_energy` holds the previous frame's decoded energies for this channel
/// and is updated in place so the next frame's inter-prediction is correct.
pub(crate) fn decode_coarse_energy(
    dec: &mut RangeDecoder,
    mode: &Mode,
    intra: bool,
    transient: bool,
    prev_energy: &mut [f32],
) -> Vec<f32> {
    let nbands = mode.nbands();
    let coef = pred_coef(transient, intra);
    let mut energy = vec![0f32; nbands];
    let mut running_intra_pred = 0f32;

    for band in 0..nbands {
        let (fs0, decay) = laplace_params(band, nbands);
        let residual = dec.decode_laplace(fs0, decay);
        // `encode_laplace`/`decode_laplace` work in fixed units; scale to
        // quarter-dB-ish log2 energy steps.
        let residual_f = residual as f32 * 0.0625;
        let prediction = if intra {
            coef.beta * running_intra_pred
        } else {
            coef.alpha * prev_energy[band]
        };
        energy[band] = prediction + residual_f;
        running_intra_pred = energy[band];
    }

    prev_energy.copy_from_slice(&energy);
    energy
}

/// Encodes the coarse per-band log2 energies for one channel of one frame.
///
/// Returns the quantized coarse energies actually coded (prediction plus the
/// rounded Laplace residual), the same values a decoder would reconstruct;
/// also used to keep `prev_energy` in sync with what the decoder will see.
pub(crate) fn encode_coarse_energy(
    enc: &mut RangeEncoder,
    mode: &Mode,
    intra: bool,
    transient: bool,
    energy: &[f32],
    prev_energy: &mut [f32],
) -> Vec<f32> {
    let nbands = mode.nbands();
    let coef = pred_coef(transient, intra);
    let mut running_intra_pred = 0f32;
    let mut quantized = vec![0f32; nbands];

    for band in 0..nbands {
        let (fs0, decay) = laplace_params(band, nbands);
        let prediction = if intra {
            coef.beta * running_intra_pred
        } else {
            coef.alpha * prev_energy[band]
        };
        let mut residual = ((energy[band] - prediction) / 0.0625).round() as i32;
        let _ = enc.encode_laplace(&mut residual, fs0, decay);
        quantized[band] = prediction + residual as f32 * 0.0625;
        running_intra_pred = quantized[band];
    }

    prev_energy.copy_from_slice(&quantized);
    quantized
}

/// Refines `energy` in place with `fine_bits[band]` raw bits of additional
/// precision per band (uniform quantization of the residual left by the
/// coarse pass).
pub(crate) fn decode_fine_energy(dec: &mut RangeDecoder, energy: &mut [f32], fine_bits: &[u32]) {
    for (e, &bits) in energy.iter_mut().zip(fine_bits.iter()) {
        if bits == 0 {
            continue;
        }
        let raw = dec.decode_bits(bits);
        let step = 1.0 / (1u32 << bits) as f32;
        *e += (raw as f32 + 0.5) * step - 0.5;
    }
}

/// Encodes the fine-energy raw bits matching [`decode_fine_energy`].
pub(crate) fn encode_fine_energy(
    enc: &mut RangeEncoder,
    energy: &[f32],
    coarse_energy: &[f32],
    fine_bits: &[u32],
) -> Result<(), crate::encoder_error::EncoderError> {
    for ((e, c), &bits) in energy.iter().zip(coarse_energy.iter()).zip(fine_bits.iter()) {
        if bits == 0 {
            continue;
        }
        let resolution = 1u32 << bits;
        let frac = ((e - c) + 0.5).clamp(0.0, 0.999_999);
        let raw = (frac * resolution as f32) as u32;
        enc.encode_bits(raw, bits)?;
    }
    Ok(())
}

/// Orders bands for the final-energy pass: priority bands first (ascending),
/// then the rest (ascending), so encoder and decoder spend the same
/// leftover bits on the same bands.
fn final_energy_order(fine_priority: &[bool]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fine_priority.len()).filter(|&b| fine_priority[b]).collect();
    order.extend((0..fine_priority.len()).filter(|&b| !fine_priority[b]));
    order
}

/// Spends the `bits_left` leftover whole bits after fine-energy coding, one
/// extra bit per band, visiting `fine_priority` bands first so the bands the
/// allocator judged most under-served get the scarce leftover bits.
pub(crate) fn decode_final_energy(
    dec: &mut RangeDecoder,
    energy: &mut [f32],
    fine_bits: &[u32],
    fine_priority: &[bool],
    mut bits_left: u32,
) {
    for band in final_energy_order(fine_priority) {
        if bits_left == 0 {
            break;
        }
        let raw = dec.decode_bits(1);
        let step = 1.0 / (1u32 << (fine_bits[band] + 1)) as f32;
        energy[band] += if raw == 1 { step } else { -step };
        bits_left -= 1;
    }
}

/// Encodes the final-energy refinement bits matching [`decode_final_energy`].
pub(crate) fn encode_final_energy(
    enc: &mut RangeEncoder,
    residual: &[f32],
    fine_priority: &[bool],
    mut bits_left: u32,
) -> Result<(), crate::encoder_error::EncoderError> {
    for band in final_energy_order(fine_priority) {
        if bits_left == 0 {
            break;
        }
        let bit = u32::from(residual[band] >= 0.0);
        enc.encode_bits(bit, 1)?;
        bits_left -= 1;
    }
    Ok(())
}
