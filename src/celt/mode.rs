//! Static CELT mode tables: band edges, overlap window, and per-frame-size parameters.
//!
//! A `Mode` describes the fixed, read-only geometry of a CELT frame at a given
//! sampling rate: how many bands it has, where they start and end, and how the
//! short-block count (`LM`) maps onto an MDCT size. None of this depends on the
//! bitstream being decoded, so a single `Mode` is built once and shared by every
//! frame at that sampling rate.

use std::f32::consts::PI;

/// Number of CELT bands (RFC 6716 Table 55, `eband5ms`).
pub(crate) const NBANDS: usize = 21;

/// Band edges in 25 Hz units at a 5 ms frame (`eband5ms` in the reference).
///
/// Multiplying by `(sampling_rate / 400) << LM` turns an edge into a sample
/// offset for a given frame size.
pub(crate) const EBANDS: [i16; NBANDS + 1] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 12, 14, 16, 20, 24, 28, 34, 40, 48, 60, 78, 100,
];

/// Largest supported `LM` (log2 of the short-block count relative to the 2.5 ms base).
pub(crate) const MAX_LM: usize = 3;

/// Overlap length (and half-window length) at the reference 48 kHz rate, in samples.
pub(crate) const OVERLAP: usize = 120;

/// Evaluates the Vorbis-derived analysis/synthesis window at sample `i` of `OVERLAP`.
///
/// This is the same shape as the Vorbis power-of-sine window, the standard choice
/// for MDCT analysis windows with perfect time-domain aliasing cancellation.
pub(crate) fn window_coeff(i: usize) -> f32 {
    debug_assert!(i < OVERLAP);
    let s = (PI / 2.0) * (i as f32 + 0.5) / OVERLAP as f32;
    (PI / 2.0 * s.sin() * s.sin()).sin()
}

/// Immutable, read-only description of a CELT mode (sample-rate family).
///
/// Built once per `CeltDecoder`/`CeltEncoder` instance and never mutated afterward,
/// matching the "precomputed once at startup" rule for shared tables.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Mode {
    /// Sampling rate this mode was built for, in Hz.
    pub(crate) sampling_rate: u32,
    /// MDCT size of an `LM == 0` (2.5 ms) frame.
    pub(crate) shortmdctsize: usize,
    /// Largest `LM` this mode allows (bounded by the 60 ms maximum Opus frame).
    pub(crate) max_lm: usize,
}

impl Mode {
    /// Builds the mode for `sampling_rate`. Opus always operates its CELT layer
    /// at a 48 kHz-equivalent 2.5 ms base MDCT size of 120 samples; a decoder
    /// targeting a lower rate still uses this mode, subsampling the output.
    pub(crate) const fn new(sampling_rate: u32) -> Self {
        Self {
            sampling_rate,
            shortmdctsize: OVERLAP,
            max_lm: MAX_LM,
        }
    }

    /// Number of bands usable at frame size `lm` (some bottom bands are merged
    /// away at small `LM` is not modeled here; CELT always codes all `NBANDS`).
    pub(crate) const fn nbands(&self) -> usize {
        NBANDS
    }

    /// Number of MDCT bins in a frame using `lm` (0..=max_lm).
    pub(crate) fn mdct_size(&self, lm: usize) -> usize {
        self.shortmdctsize << lm
    }

    /// Number of short blocks a frame of size `lm` is split into for the
    /// transient (time-frequency resolution) case.
    pub(crate) fn short_blocks(&self, lm: usize) -> usize {
        1 << lm
    }

    /// Sample offset (at this mode's `lm`) of the start of band `band`.
    pub(crate) fn band_start(&self, band: usize, lm: usize) -> usize {
        (EBANDS[band] as usize) << lm
    }

    /// Sample offset (at this mode's `lm`) of the end of band `band`.
    pub(crate) fn band_end(&self, band: usize, lm: usize) -> usize {
        (EBANDS[band + 1] as usize) << lm
    }

    /// Width, in MDCT bins, of band `band` at frame size `lm`.
    pub(crate) fn band_width(&self, band: usize, lm: usize) -> usize {
        self.band_end(band, lm) - self.band_start(band, lm)
    }
}
