//! Implements the CELT decoder.

use crate::celt::bands::{decode_coarse_energy, decode_fine_energy, decode_final_energy};
use crate::celt::bitalloc::allocate_bits;
use crate::celt::comb_filter::comb_filter_inplace;
use crate::celt::mdct::Mdct;
use crate::celt::mode::{self, Mode};
use crate::celt::pvq::{decode_pulses, normalize_shape, PulseCache};
use crate::celt::stereo::{anti_collapse, mid_side_decode};
use crate::celt::tables::{INTRA_ICDF, SPREAD_ICDF, TRANSIENT_ICDF, TRIM_ICDF};
use crate::range_coder::RangeDecoder;
use crate::{Channels, DecoderError, SamplingRate};

/// A cap on pulses assigned to a single band, keeping the PVQ combinatorial
/// index (`V(n, k)`) within `u32` range for every band width this mode uses.
const MAX_BAND_PULSES: usize = 16;

/// The CELT decoder.
///
/// Holds the persistent per-channel state that must survive across frames:
/// the previous frame's band energies (for coarse-energy prediction) and the
/// trailing half of the previous frame's synthesis window (for overlap-add).
#[derive(Clone, Debug)]
pub(crate) struct CeltDecoder {
    mode: Mode,
    channels: usize,
    prev_energy: Vec<Vec<f32>>,
    overlap: Vec<Vec<f32>>,
    rng_seed: u32,
    last_pitch: u32,
}

impl CeltDecoder {
    /// Creates a new CELT decoder.
    pub(crate) fn new(
        sampling_rate: SamplingRate,
        channels: Channels,
    ) -> Result<Self, DecoderError> {
        let mode = Mode::new(sampling_rate as u32);
        let nchannels = channels as usize;
        Ok(Self {
            prev_energy: vec![vec![0.0; mode.nbands()]; nchannels],
            overlap: vec![vec![0.0; mode::OVERLAP]; nchannels],
            mode,
            channels: nchannels,
            rng_seed: 0x1234_5678,
            last_pitch: 0,
        })
    }

    /// Resets the CELT decoder.
    pub(crate) fn reset(&mut self) -> Result<(), DecoderError> {
        for e in &mut self.prev_energy {
            e.iter_mut().for_each(|v| *v = 0.0);
        }
        for o in &mut self.overlap {
            o.iter_mut().for_each(|v| *v = 0.0);
        }
        self.rng_seed = 0x1234_5678;
        self.last_pitch = 0;
        Ok(())
    }

    /// Gets the pitch of the last decoded frame.
    pub(crate) fn pitch(&self) -> u32 {
        self.last_pitch
    }

    /// Decodes one CELT frame of `frame_size` samples per channel from `dec`
    /// into `out` (interleaved if stereo), given `total_bits` available to
    /// the frame (derived by the caller from the remaining packet length).
    pub(crate) fn decode(
        &mut self,
        dec: &mut RangeDecoder,
        out: &mut [f32],
        frame_size: usize,
        total_bits: u32,
    ) -> Result<(), DecoderError> {
        let lm = lm_for_frame_size(&self.mode, frame_size)?;
        let n = self.mode.mdct_size(lm);
        let nbands = self.mode.nbands();

        let silence = dec.decode_bit_logp(15);
        if silence {
            out.iter_mut().for_each(|v| *v = 0.0);
            // Silence still consumes the frame; fade the coarse-energy
            // predictor toward zero instead of leaving it stale for the
            // next non-silent frame's prediction.
            for energy in &mut self.prev_energy {
                energy.iter_mut().for_each(|e| *e *= 0.5);
            }
            return Ok(());
        }

        let post_filter = dec.decode_bit_logp(1);
        let (pf_period, pf_gain, pf_tapset) = if post_filter {
            let octave = dec.decode_bits(4);
            let period = (16usize << octave) + dec.decode_bits(4 + octave) as usize - 1;
            let gain_q = dec.decode_bits(3);
            let gain = gain_q as f32 * 0.1;
            let tapset = dec.decode_icdf(&crate::celt::tables::TAPSET_ICDF, 2) as usize;
            (period, gain, tapset)
        } else {
            (0, 0.0, 0)
        };

        let transient = lm > 0 && dec.decode_icdf(&TRANSIENT_ICDF, 1) == 1;
        let intra = dec.decode_icdf(&INTRA_ICDF, 1) == 1;
        let _spread = dec.decode_icdf(&SPREAD_ICDF, 2);
        let alloc_trim = dec.decode_icdf(&TRIM_ICDF, 7) as i32;

        let alloc = allocate_bits(&self.mode, lm, total_bits, self.channels, alloc_trim);
        let fine_bits: Vec<u32> = alloc.bits.iter().map(|&b| (b / 16).min(7)).collect();
        let pulse_bits: Vec<u32> = alloc
            .bits
            .iter()
            .zip(fine_bits.iter())
            .map(|(&b, &f)| b.saturating_sub(f * 16))
            .collect();

        let pulse_cache = PulseCache::new(self.mode.mdct_size(lm), MAX_BAND_PULSES);

        let mdct = Mdct::new(n);
        let mut channel_time = Vec::with_capacity(self.channels);

        for ch in 0..self.channels {
            let mut energy =
                decode_coarse_energy(dec, &self.mode, intra, transient, &mut self.prev_energy[ch]);

            let mut spectrum = vec![0f32; n];
            for band in 0..nbands {
                let start = self.mode.band_start(band, lm);
                let end = self.mode.band_end(band, lm);
                let width = end - start;
                let k = ((pulse_bits[band] as usize) / 3).min(MAX_BAND_PULSES).min(width.max(1));

                let shape = if k == 0 {
                    let mut zero = vec![0f32; width];
                    anti_collapse(&mut zero, &mut self.rng_seed, (2.0f32).powf(energy[band]));
                    zero
                } else {
                    let total = pulse_cache.v(width, k);
                    let capped_total = total.min(u32::MAX as u64).max(2) as u32;
                    let index = dec.decode_uint(capped_total) as u64;
                    let y = decode_pulses(index, width, k, &pulse_cache);
                    normalize_shape(&y)
                };

                let gain = (2.0f32).powf(energy[band]);
                for (s, v) in spectrum[start..end].iter_mut().zip(shape.iter()) {
                    *s = v * gain;
                }
            }

            decode_fine_energy(dec, &mut energy, &fine_bits);
            let bits_left = alloc.per_channel_bits.saturating_sub(alloc.bits.iter().sum());
            decode_final_energy(dec, &mut energy, &fine_bits, &alloc.fine_priority, bits_left);

            let time = mdct.backward(&spectrum);
            let mut windowed = vec![0f32; 2 * n];
            for (i, w) in windowed.iter_mut().enumerate() {
                *w = time[i] * synthesis_window(i, n);
            }

            let mut frame = vec![0f32; n];
            for i in 0..n {
                let tail = self.overlap[ch].get(i).copied().unwrap_or(0.0);
                frame[i] = tail + windowed[i];
            }
            let old_tail = std::mem::replace(&mut self.overlap[ch], windowed[n..2 * n].to_vec());

            if post_filter {
                // comb_filter_inplace looks up to `t1 + 2` samples before its
                // offset; pad the front of the buffer with history so that
                // never underflows.
                let pad = pf_period + 2;
                let mut padded = vec![0f32; pad + n];
                let tail_len = old_tail.len().min(pad);
                padded[pad - tail_len..pad].copy_from_slice(&old_tail[old_tail.len() - tail_len..]);
                padded[pad..].copy_from_slice(&frame);

                comb_filter_inplace(
                    &mut padded,
                    pad,
                    pf_period,
                    pf_period,
                    n,
                    pf_gain,
                    pf_gain,
                    pf_tapset,
                    pf_tapset,
                    mode::OVERLAP.min(n),
                );

                frame.copy_from_slice(&padded[pad..]);
            }

            channel_time.push(frame);
        }

        let frames = if self.channels == 2 {
            let (l, r) = mid_side_decode(&channel_time[0], &channel_time[1]);
            vec![l, r]
        } else {
            channel_time
        };

        for (i, slot) in out.iter_mut().enumerate() {
            let ch = i % self.channels;
            let sample_idx = i / self.channels;
            *slot = frames[ch].get(sample_idx).copied().unwrap_or(0.0);
        }

        self.last_pitch = pf_period as u32;
        Ok(())
    }
}

/// Window applied at the start and end of a 2N-sample MDCT output for
/// overlap-add; flat (no tapering) in the untouched middle section.
pub(crate) fn synthesis_window(i: usize, n: usize) -> f32 {
    let overlap = mode::OVERLAP.min(n);
    if i < overlap {
        mode::window_coeff(i)
    } else if i >= 2 * n - overlap {
        mode::window_coeff(2 * n - 1 - i)
    } else {
        1.0
    }
}

/// Maps a requested frame size (in samples) to the `LM` parameter the mode
/// uses for band edges and MDCT sizing.
pub(crate) fn lm_for_frame_size(mode: &Mode, frame_size: usize) -> Result<usize, DecoderError> {
    for lm in 0..=mode.max_lm {
        if mode.mdct_size(lm) == frame_size {
            return Ok(lm);
        }
    }
    Err(DecoderError::InvalidPacket)
}
