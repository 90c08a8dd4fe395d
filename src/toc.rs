//! TOC (table-of-contents) byte decoding, RFC 6716 section 3.1.
//!
//! [`query_packet_bandwidth`](crate::query_packet_bandwidth),
//! [`query_packet_channel_count`](crate::query_packet_channel_count) and
//! friends answer single questions about a packet's first byte. [`Toc`]
//! bundles the full decode into one struct for callers (the packet router,
//! the multistream demuxer) that need more than one field at a time.

use crate::{
    query_packet_bandwidth, query_packet_channel_count, query_packet_codec_mode,
    query_packet_frame_count, Bandwidth, Channels, CodecMode, DecoderError,
};

/// How the frame count byte (if any) and frame lengths are encoded.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FrameCountCode {
    /// A single frame, size given by the packet length.
    One,
    /// Two frames of identical, implicit size.
    TwoEqual,
    /// Two frames with an explicit length for the first.
    TwoDifferent,
    /// An arbitrary number of frames (0 to 48), governed by a count byte.
    Arbitrary,
}

/// A fully decoded TOC byte.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Toc {
    pub(crate) mode: CodecMode,
    pub(crate) bandwidth: Bandwidth,
    pub(crate) channels: Channels,
    pub(crate) config: u8,
    pub(crate) frame_count_code: FrameCountCode,
}

impl Toc {
    /// Decodes the TOC byte from the first byte of `packet`.
    pub(crate) fn parse(packet: &[u8]) -> Result<Self, DecoderError> {
        if packet.is_empty() {
            return Err(DecoderError::InvalidPacket);
        }
        let config = (packet[0] & 0xF8) >> 3;
        let frame_count_code = match packet[0] & 0x3 {
            0 => FrameCountCode::One,
            1 => FrameCountCode::TwoEqual,
            2 => FrameCountCode::TwoDifferent,
            3 => FrameCountCode::Arbitrary,
            _ => unreachable!(),
        };
        Ok(Self {
            mode: query_packet_codec_mode(packet),
            bandwidth: query_packet_bandwidth(packet),
            channels: query_packet_channel_count(packet),
            config,
            frame_count_code,
        })
    }

    /// Number of frames signaled by the TOC/frame-count byte(s). For
    /// [`FrameCountCode::Arbitrary`] this still needs the second packet byte,
    /// which [`query_packet_frame_count`] reads for us.
    pub(crate) fn frame_count(&self, packet: &[u8]) -> Result<usize, DecoderError> {
        query_packet_frame_count(packet)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_parse_celt_fullband_single_frame() {
        // config 31 (0b11111) selects CELT/fullband/2.5ms, stereo, 1 frame.
        let packet = [0b1111_1100u8, 0, 0];
        let toc = Toc::parse(&packet).unwrap();
        assert_eq!(toc.mode, CodecMode::Celt);
        assert_eq!(toc.bandwidth, Bandwidth::Fullband);
        assert_eq!(toc.channels, Channels::Stereo);
        assert_eq!(toc.frame_count_code, FrameCountCode::One);
    }

    #[test]
    fn test_parse_silk_narrowband_arbitrary_frames() {
        let packet = [0b0000_0011u8, 0x01];
        let toc = Toc::parse(&packet).unwrap();
        assert_eq!(toc.mode, CodecMode::Silk);
        assert_eq!(toc.bandwidth, Bandwidth::Narrowband);
        assert_eq!(toc.frame_count_code, FrameCountCode::Arbitrary);
        assert_eq!(toc.frame_count(&packet).unwrap(), 1);
    }

    #[test]
    fn test_parse_empty_packet_is_invalid() {
        assert!(Toc::parse(&[]).is_err());
    }
}
