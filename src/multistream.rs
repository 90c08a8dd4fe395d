//! Channel-mapping families and multistream packet routing, RFC 7845 section
//! 5.1.1 / libopus `opus_multistream.c`.
//!
//! A multistream Opus packet (used by the Ogg container and by
//! applications doing surround or ambisonic playback) bundles several
//! independent Opus streams, each with 1 or 2 channels, and a matrix that
//! maps their decoded channels onto the application's output channels.
//! Family 0 and 1 are the common mono/stereo and fixed surround layouts;
//! family 2 and 3 describe ambisonic (spherical-harmonic) layouts; family
//! 255 is a fully explicit, application-supplied mapping.

use crate::math::isqrt;
use crate::DecoderError;

/// Special mapping value marking an output channel as silent (not produced
/// by any decoded stream).
pub(crate) const MAPPING_SILENCE: u8 = 255;

/// Mapping-family-1 fixed Vorbis surround layouts for 1 to 8 channels
/// (RFC 7845 section 5.1.1.2), indexed by `channels - 1`. Each row lists,
/// for every output channel in order, which decoded channel feeds it.
const FAMILY_1_MAPPING: [&[u8]; 8] = [
    &[0],
    &[0, 1],
    &[0, 2, 1],
    &[0, 1, 2, 3],
    &[0, 4, 1, 2, 3],
    &[0, 4, 1, 2, 3, 5],
    &[0, 4, 1, 2, 3, 5, 6],
    &[0, 6, 1, 2, 3, 4, 5, 7],
];

/// Mapping-family-1 default `(streams, coupled_streams)` per channel count,
/// indexed by `channels - 1`.
const FAMILY_1_STREAMS: [(usize, usize); 8] = [
    (1, 0),
    (1, 1),
    (2, 1),
    (2, 2),
    (3, 2),
    (4, 2),
    (4, 3),
    (5, 3),
];

/// How a multistream packet's decoded streams map onto output channels.
#[derive(Clone, Debug)]
pub(crate) struct ChannelMapping {
    /// Total number of output channels.
    pub(crate) channels: usize,
    /// Number of encoded streams.
    pub(crate) streams: usize,
    /// Number of those streams that are coupled (stereo) rather than mono.
    pub(crate) coupled_streams: usize,
    /// For each output channel, which decoded channel feeds it (or
    /// [`MAPPING_SILENCE`]). Decoded channel `i` is the left channel of
    /// coupled stream `i` for `i < 2*coupled_streams`, else mono stream
    /// `i - coupled_streams`. Unused (and left empty) when `demix_matrix`
    /// is set, since the projection matrix replaces this per-channel
    /// lookup with a full mix.
    pub(crate) mapping: Vec<u8>,
    /// Mapping-family-3 demixing matrix: `channels` rows by
    /// `decoded_channels()` columns, row-major, already descaled from its
    /// wire representation (signed 16-bit, divided by 32768). `None` for
    /// every other family, where `mapping` is used directly instead.
    pub(crate) demix_matrix: Option<Vec<f32>>,
}

impl ChannelMapping {
    /// Builds the fixed mapping for mapping family 0: one stream, 1 or 2
    /// channels, no coupling table needed.
    pub(crate) fn family_0(stereo: bool) -> Self {
        if stereo {
            Self {
                channels: 2,
                streams: 1,
                coupled_streams: 1,
                mapping: vec![0, 1],
                demix_matrix: None,
            }
        } else {
            Self {
                channels: 1,
                streams: 1,
                coupled_streams: 0,
                mapping: vec![0],
                demix_matrix: None,
            }
        }
    }

    /// Builds the fixed Vorbis surround mapping for mapping family 1
    /// (1 to 8 channels: mono, stereo, 3.0, quad, 5.0, 5.1, 6.1, 7.1).
    pub(crate) fn family_1(channels: usize) -> Result<Self, DecoderError> {
        if channels == 0 || channels > FAMILY_1_MAPPING.len() {
            return Err(DecoderError::InvalidChannels);
        }
        let (streams, coupled_streams) = FAMILY_1_STREAMS[channels - 1];
        Ok(Self {
            channels,
            streams,
            coupled_streams,
            mapping: FAMILY_1_MAPPING[channels - 1].to_vec(),
            demix_matrix: None,
        })
    }

    /// Validates and builds an explicit mapping (mapping family 255), as
    /// read from an Ogg OpusHead or passed in by the application.
    pub(crate) fn explicit(
        channels: usize,
        streams: usize,
        coupled_streams: usize,
        mapping: Vec<u8>,
    ) -> Result<Self, DecoderError> {
        if channels == 0 || channels > 255 {
            return Err(DecoderError::InvalidChannels);
        }
        if streams == 0 || streams > 255 {
            return Err(DecoderError::InvalidStreams);
        }
        if coupled_streams > streams {
            return Err(DecoderError::InvalidCoupledStreams);
        }
        let decoded_channels = streams + coupled_streams;
        if decoded_channels > 255 {
            return Err(DecoderError::TooManyChannels);
        }
        if mapping.len() != channels {
            return Err(DecoderError::InvalidMapping);
        }
        for &m in &mapping {
            if m != MAPPING_SILENCE && usize::from(m) >= decoded_channels {
                return Err(DecoderError::InvalidMapping);
            }
        }
        Ok(Self {
            channels,
            streams,
            coupled_streams,
            mapping,
            demix_matrix: None,
        })
    }

    /// Builds a mapping-family-2 ambisonic layout: `channels` must be
    /// `(order+1)^2`, optionally plus a non-diegetic stereo pair, and every
    /// ambisonic channel is its own mono stream (no mixing).
    pub(crate) fn ambisonic(channels: usize) -> Result<Self, DecoderError> {
        Self::validate_ambisonic_channel_count(channels)?;
        Ok(Self {
            channels,
            streams: channels,
            coupled_streams: 0,
            mapping: (0..channels).map(|c| c as u8).collect(),
            demix_matrix: None,
        })
    }

    /// Builds a mapping-family-3 ambisonic layout with projection: `streams`
    /// encoded streams (of which `coupled_streams` are stereo) are demixed
    /// into `channels` ambisonic (plus optional non-diegetic) output
    /// channels through `demix_matrix`, a `channels` by
    /// `streams + coupled_streams` row-major matrix.
    pub(crate) fn ambisonic_projection(
        channels: usize,
        streams: usize,
        coupled_streams: usize,
        demix_matrix: Vec<f32>,
    ) -> Result<Self, DecoderError> {
        Self::validate_ambisonic_channel_count(channels)?;
        if streams == 0 || streams > 255 {
            return Err(DecoderError::InvalidStreams);
        }
        if coupled_streams > streams {
            return Err(DecoderError::InvalidCoupledStreams);
        }
        let decoded_channels = streams + coupled_streams;
        if decoded_channels > 255 {
            return Err(DecoderError::TooManyChannels);
        }
        if demix_matrix.len() != channels * decoded_channels {
            return Err(DecoderError::InvalidProjectionMatrix);
        }
        Ok(Self {
            channels,
            streams,
            coupled_streams,
            mapping: Vec::new(),
            demix_matrix: Some(demix_matrix),
        })
    }

    /// Validates an ambisonic channel count (families 2 and 3): `channels`
    /// must be `(order+1)^2`, optionally plus a stereo non-diegetic pair.
    pub(crate) fn validate_ambisonic_channel_count(channels: usize) -> Result<(), DecoderError> {
        let is_square = |n: usize| {
            let r = isqrt(n as u32);
            r * r == n as u32
        };
        if is_square(channels) || (channels >= 2 && is_square(channels - 2)) {
            Ok(())
        } else {
            Err(DecoderError::InvalidLayout)
        }
    }

    /// Number of decoded (pre-mixing) channels across all streams.
    pub(crate) fn decoded_channels(&self) -> usize {
        self.streams + self.coupled_streams
    }

    /// Returns, for output channel `ch`, the decoded channel index feeding
    /// it, or `None` if that output channel is silent. Meaningless (and
    /// unused) when `demix_matrix` is set.
    pub(crate) fn source_channel(&self, ch: usize) -> Option<usize> {
        match self.mapping.get(ch) {
            Some(&MAPPING_SILENCE) | None => None,
            Some(&m) => Some(usize::from(m)),
        }
    }

    /// Mixes `decoded` (interleaved, `decoded_channels()` wide, `frame_size`
    /// samples per channel) onto `out` (interleaved, `channels` wide),
    /// either via the plain per-channel lookup (`mapping`) or, for
    /// mapping family 3, via the full `demix_matrix` multiply.
    pub(crate) fn mix(&self, decoded: &[f32], frame_size: usize, out: &mut [f32]) {
        let decoded_channels = self.decoded_channels();
        match &self.demix_matrix {
            Some(matrix) => {
                for t in 0..frame_size {
                    for c in 0..self.channels {
                        let row = &matrix[c * decoded_channels..(c + 1) * decoded_channels];
                        let frame = &decoded[t * decoded_channels..(t + 1) * decoded_channels];
                        out[t * self.channels + c] =
                            row.iter().zip(frame.iter()).map(|(m, s)| m * s).sum();
                    }
                }
            }
            None => {
                for t in 0..frame_size {
                    for ch in 0..self.channels {
                        out[t * self.channels + ch] = match self.source_channel(ch) {
                            None => 0.0,
                            Some(src) => decoded[t * decoded_channels + src],
                        };
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_family_0_mono() {
        let mapping = ChannelMapping::family_0(false);
        assert_eq!(mapping.channels, 1);
        assert_eq!(mapping.streams, 1);
        assert_eq!(mapping.coupled_streams, 0);
    }

    #[test]
    fn test_family_1_stereo_is_one_coupled_stream() {
        let mapping = ChannelMapping::family_1(2).unwrap();
        assert_eq!(mapping.streams, 1);
        assert_eq!(mapping.coupled_streams, 1);
        assert_eq!(mapping.mapping, vec![0, 1]);
    }

    #[test]
    fn test_family_1_five_point_one() {
        let mapping = ChannelMapping::family_1(6).unwrap();
        assert_eq!(mapping.channels, 6);
        assert_eq!(mapping.streams, 4);
        assert_eq!(mapping.coupled_streams, 2);
        assert_eq!(mapping.decoded_channels(), 6);
        assert_eq!(mapping.mapping, vec![0, 4, 1, 2, 3, 5]);
    }

    #[test]
    fn test_family_1_rejects_zero_and_oversized_channel_counts() {
        assert!(ChannelMapping::family_1(0).is_err());
        assert!(ChannelMapping::family_1(9).is_err());
    }

    #[test]
    fn test_explicit_rejects_out_of_range_mapping() {
        let result = ChannelMapping::explicit(2, 1, 0, vec![0, 5]);
        assert!(matches!(result, Err(DecoderError::InvalidMapping)));
    }

    #[test]
    fn test_explicit_rejects_coupled_exceeding_streams() {
        let result = ChannelMapping::explicit(2, 1, 2, vec![0, 1]);
        assert!(matches!(result, Err(DecoderError::InvalidCoupledStreams)));
    }

    #[test]
    fn test_explicit_accepts_silent_channel() {
        let mapping = ChannelMapping::explicit(3, 1, 1, vec![0, 1, MAPPING_SILENCE]).unwrap();
        assert_eq!(mapping.source_channel(2), None);
        assert_eq!(mapping.source_channel(0), Some(0));
    }

    #[test]
    fn test_ambisonic_first_order_is_valid() {
        // First-order ambisonics: (1+1)^2 = 4 channels.
        assert!(ChannelMapping::validate_ambisonic_channel_count(4).is_ok());
    }

    #[test]
    fn test_ambisonic_first_order_with_stereo_pair_is_valid() {
        assert!(ChannelMapping::validate_ambisonic_channel_count(6).is_ok());
    }

    #[test]
    fn test_ambisonic_invalid_count_is_rejected() {
        assert!(ChannelMapping::validate_ambisonic_channel_count(5).is_err());
    }

    #[test]
    fn test_ambisonic_builds_one_stream_per_channel() {
        let mapping = ChannelMapping::ambisonic(4).unwrap();
        assert_eq!(mapping.streams, 4);
        assert_eq!(mapping.coupled_streams, 0);
        assert_eq!(mapping.mapping, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_ambisonic_projection_rejects_mismatched_matrix() {
        let result = ChannelMapping::ambisonic_projection(4, 2, 0, vec![0.0; 3]);
        assert!(matches!(result, Err(DecoderError::InvalidProjectionMatrix)));
    }

    #[test]
    fn test_ambisonic_projection_mix_applies_matrix() {
        // Two decoded channels, demixed into a single ambisonic channel by
        // simple averaging.
        let mapping = ChannelMapping::ambisonic_projection(1, 2, 0, vec![0.5, 0.5]).unwrap();
        let decoded = vec![1.0f32, 3.0, 2.0, 4.0];
        let mut out = vec![0.0f32; 2];
        mapping.mix(&decoded, 2, &mut out);
        assert_eq!(out, vec![2.0, 3.0]);
    }
}
