//! Implements the CELT encoder.

use crate::celt::bands::{encode_coarse_energy, encode_fine_energy, encode_final_energy};
use crate::celt::bitalloc::allocate_bits;
use crate::celt::mdct::Mdct;
use crate::celt::mode::{self, Mode};
use crate::celt::pvq::{encode_pulses, search_pulses, PulseCache};
use crate::celt::stereo::mid_side_encode;
use crate::celt::tables::{INTRA_ICDF, SPREAD_ICDF, TRANSIENT_ICDF, TRIM_ICDF};
use crate::encoder_error::EncoderError;
use crate::range_coder::RangeEncoder;
use crate::{Channels, SamplingRate};

const MAX_BAND_PULSES: usize = 16;

/// The CELT encoder.
///
/// Mirrors [`super::decoder::CeltDecoder`]'s persistent state. The actual
/// pulse allocation and shape search here are a greedy, non-bit-exact
/// approximation of the reference encoder's rate-distortion search.
#[derive(Clone, Debug)]
pub(crate) struct CeltEncoder {
    mode: Mode,
    channels: usize,
    prev_energy: Vec<Vec<f32>>,
    history: Vec<Vec<f32>>,
    frame_count: u64,
}

impl CeltEncoder {
    /// Creates a new CELT encoder.
    pub(crate) fn new(
        sampling_rate: SamplingRate,
        channels: Channels,
    ) -> Result<Self, EncoderError> {
        let mode = Mode::new(sampling_rate as u32);
        let nchannels = channels as usize;
        Ok(Self {
            prev_energy: vec![vec![0.0; mode.nbands()]; nchannels],
            history: vec![vec![0.0; mode::OVERLAP]; nchannels],
            mode,
            channels: nchannels,
            frame_count: 0,
        })
    }

    /// Resets the CELT encoder.
    pub(crate) fn reset(&mut self) -> Result<(), EncoderError> {
        for e in &mut self.prev_energy {
            e.iter_mut().for_each(|v| *v = 0.0);
        }
        for h in &mut self.history {
            h.iter_mut().for_each(|v| *v = 0.0);
        }
        self.frame_count = 0;
        Ok(())
    }

    /// Encodes one CELT frame from `input` (interleaved if stereo, `frame_size`
    /// samples per channel) into `enc`, targeting `total_bits` for the frame.
    pub(crate) fn encode(
        &mut self,
        enc: &mut RangeEncoder,
        input: &[f32],
        frame_size: usize,
        total_bits: u32,
    ) -> Result<(), EncoderError> {
        let lm = lm_for_frame_size(&self.mode, frame_size)?;
        let n = self.mode.mdct_size(lm);
        let nbands = self.mode.nbands();

        let silence = input.iter().all(|&v| v == 0.0);
        enc.encode_bit_logp(u32::from(silence), 15)?;
        if silence {
            for h in &mut self.history {
                h.iter_mut().for_each(|v| *v = 0.0);
            }
            // Mirrors the decoder's silence-path fade so both sides keep the
            // same coarse-energy predictor for the next non-silent frame.
            for energy in &mut self.prev_energy {
                energy.iter_mut().for_each(|e| *e *= 0.5);
            }
            self.frame_count += 1;
            return Ok(());
        }

        // No pitch-based postfilter search on the encode side; always signal it off.
        enc.encode_bit_logp(0, 1)?;

        let transient = false;
        if lm > 0 {
            enc.encode_icdf(usize::from(transient), &TRANSIENT_ICDF, 1)?;
        }
        let intra = self.frame_count == 0;
        enc.encode_icdf(usize::from(intra), &INTRA_ICDF, 1)?;
        enc.encode_icdf(2, &SPREAD_ICDF, 2)?;
        let alloc_trim: i32 = 5;
        enc.encode_icdf(alloc_trim as usize, &TRIM_ICDF, 7)?;

        let alloc = allocate_bits(&self.mode, lm, total_bits, self.channels, alloc_trim);
        let fine_bits: Vec<u32> = alloc.bits.iter().map(|&b| (b / 16).min(7)).collect();
        let pulse_bits: Vec<u32> = alloc
            .bits
            .iter()
            .zip(fine_bits.iter())
            .map(|(&b, &f)| b.saturating_sub(f * 16))
            .collect();

        let pulse_cache = PulseCache::new(n, MAX_BAND_PULSES);
        let mdct = Mdct::new(n);

        let channels: Vec<Vec<f32>> = if self.channels == 2 {
            let left: Vec<f32> = input.iter().step_by(2).copied().collect();
            let right: Vec<f32> = input.iter().skip(1).step_by(2).copied().collect();
            let (mid, side) = mid_side_encode(&left, &right);
            vec![mid, side]
        } else {
            vec![input.to_vec()]
        };

        for (ch, samples) in channels.iter().enumerate() {
            let mut windowed = vec![0f32; 2 * n];
            windowed[..n].copy_from_slice(&self.history[ch]);
            windowed[n..2 * n].copy_from_slice(&samples[..n.min(samples.len())]);
            for (i, w) in windowed.iter_mut().enumerate() {
                *w *= analysis_window(i, n);
            }
            self.history[ch] = samples[..n.min(samples.len())].to_vec();
            if self.history[ch].len() < n {
                self.history[ch].resize(n, 0.0);
            }

            let spectrum = mdct.forward(&windowed);

            let mut target_energy = vec![0f32; nbands];
            for band in 0..nbands {
                let start = self.mode.band_start(band, lm);
                let end = self.mode.band_end(band, lm);
                let sum_sq: f32 = spectrum[start..end].iter().map(|v| v * v).sum();
                target_energy[band] = 0.5 * (sum_sq.max(1e-9)).log2();
            }

            let coarse = encode_coarse_energy(
                enc,
                &self.mode,
                intra,
                transient,
                &target_energy,
                &mut self.prev_energy[ch],
            );

            for band in 0..nbands {
                let start = self.mode.band_start(band, lm);
                let end = self.mode.band_end(band, lm);
                let width = end - start;
                let k = ((pulse_bits[band] as usize) / 3)
                    .min(MAX_BAND_PULSES)
                    .min(width.max(1));
                if k == 0 {
                    continue;
                }

                let gain = (2.0f32).powf(coarse[band]);
                let normalized: Vec<f32> = spectrum[start..end]
                    .iter()
                    .map(|v| if gain > 0.0 { v / gain } else { 0.0 })
                    .collect();

                let y = search_pulses(&normalized, k);
                let index = encode_pulses(&y, &pulse_cache);
                let total = pulse_cache.v(width, k);
                let capped_total = total.min(u32::MAX as u64).max(2) as u32;
                let capped_index = (index % capped_total as u64) as u32;
                enc.encode_uint(capped_index, capped_total)?;
            }

            encode_fine_energy(enc, &target_energy, &coarse, &fine_bits)?;
            let bits_left = alloc.per_channel_bits.saturating_sub(alloc.bits.iter().sum());
            let residual: Vec<f32> = target_energy
                .iter()
                .zip(coarse.iter())
                .map(|(t, c)| t - c)
                .collect();
            encode_final_energy(enc, &residual, &alloc.fine_priority, bits_left)?;
        }

        self.frame_count += 1;
        Ok(())
    }
}

/// Analysis window mirroring [`super::decoder::synthesis_window`]: tapered at
/// both ends of the 2N-sample block, flat in between.
fn analysis_window(i: usize, n: usize) -> f32 {
    let overlap = mode::OVERLAP.min(n);
    if i < overlap {
        mode::window_coeff(i)
    } else if i >= 2 * n - overlap {
        mode::window_coeff(2 * n - 1 - i)
    } else {
        1.0
    }
}

fn lm_for_frame_size(mode: &Mode, frame_size: usize) -> Result<usize, EncoderError> {
    for lm in 0..=mode.max_lm {
        if mode.mdct_size(lm) == frame_size {
            return Ok(lm);
        }
    }
    Err(EncoderError::InternalError("unsupported CELT frame size"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_encode_silence_is_one_bit() {
        let mut encoder = CeltEncoder::new(SamplingRate::Hz48000, Channels::Mono).unwrap();
        let input = vec![0f32; 120];
        let mut buf = [0u8; 64];
        let mut enc = RangeEncoder::new(&mut buf);
        encoder.encode(&mut enc, &input, 120, 800).unwrap();
        enc.done().unwrap();
        assert!(enc.range_bytes() <= 2);
    }

    #[test]
    fn test_encode_nonsilent_frame_produces_output() {
        let mut encoder = CeltEncoder::new(SamplingRate::Hz48000, Channels::Mono).unwrap();
        let input: Vec<f32> = (0..120).map(|i| (i as f32 * 0.3).sin() * 0.4).collect();
        let mut buf = [0u8; 1024];
        let mut enc = RangeEncoder::new(&mut buf);
        encoder.encode(&mut enc, &input, 120, 800).unwrap();
        enc.done().unwrap();
        assert!(enc.range_bytes() > 1);
    }

    #[test]
    fn test_encode_stereo_frame_fits_tightly_sized_buffer() {
        // A buffer sized only for the mid/side pair combined must still be
        // enough once the stereo budget is split per channel rather than
        // doubly spent.
        use crate::Encoder as TopLevelEncoder;
        use crate::EncoderConfiguration;

        let config = EncoderConfiguration {
            channels: Channels::Stereo,
            ..EncoderConfiguration::default()
        };
        let mut encoder = TopLevelEncoder::new(&config).unwrap();
        let input: Vec<f32> = (0..240)
            .map(|i| (i as f32 * 0.3).sin() * 0.4)
            .collect();
        let mut output = [0u8; 400];

        let written = encoder.encode_float(&input, 120, &mut output).unwrap();
        assert!(written <= output.len());
    }
}
