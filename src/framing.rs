//! Self-delimited and implicit-length packet framing, RFC 6716 section 3.2.
//!
//! [`crate::parse_packet`] does the actual offset/length arithmetic (kept in
//! the crate root since it predates this module and has its own test suite).
//! [`FrameLayout`] wraps that call into an owned, easier-to-consume result for
//! the packet router and multistream demuxer; [`write_frame_length`] is the
//! encode-side counterpart, used when producing self-delimited packets.

use crate::{parse_packet, DecoderError};

/// Maximum number of frames a single Opus packet may contain.
pub(crate) const MAX_FRAMES: usize = 48;

/// Owned decode of one packet's frame layout.
#[derive(Clone, Debug)]
pub(crate) struct FrameLayout {
    /// Start offset (from the packet's first byte) of each frame's payload.
    pub(crate) offsets: Vec<usize>,
    /// Length in bytes of each frame's payload.
    pub(crate) sizes: Vec<usize>,
    /// Offset of the first frame's payload, i.e. past the TOC and any count/
    /// length bytes.
    pub(crate) payload_offset: usize,
    /// Offset of the next sub-packet, used when demultiplexing.
    pub(crate) packet_offset: usize,
}

impl FrameLayout {
    /// Parses the frame layout of `packet`.
    pub(crate) fn parse(packet: &[u8], self_delimited: bool) -> Result<Self, DecoderError> {
        let mut frames = [0usize; MAX_FRAMES];
        let mut sizes = [0usize; MAX_FRAMES];
        let mut payload_offset = 0usize;
        let mut packet_offset = 0usize;

        let count = parse_packet(
            packet,
            self_delimited,
            Some(&mut frames),
            &mut sizes,
            Some(&mut payload_offset),
            Some(&mut packet_offset),
        )?;

        Ok(Self {
            offsets: frames[..count].to_vec(),
            sizes: sizes[..count].to_vec(),
            payload_offset,
            packet_offset,
        })
    }

    /// Number of frames in the packet.
    pub(crate) fn frame_count(&self) -> usize {
        self.sizes.len()
    }
}

/// Encodes `size` as a self-delimiting length prefix (RFC 6716 section 3.2.1),
/// appending 1 or 2 bytes to `out`. Mirrors the decode side in
/// [`crate::parse_packet`]'s private `parse_size` helper.
pub(crate) fn write_frame_length(out: &mut Vec<u8>, size: usize) {
    if size < 252 {
        out.push(size as u8);
    } else {
        let size = size - 252;
        out.push(252 + (size & 0x3) as u8);
        out.push((size >> 2) as u8);
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_single_frame_layout() {
        let packet = [0x00u8, 1, 2, 3];
        let layout = FrameLayout::parse(&packet, false).unwrap();
        assert_eq!(layout.frame_count(), 1);
        assert_eq!(layout.offsets, vec![1]);
        assert_eq!(layout.sizes, vec![3]);
    }

    #[test]
    fn test_write_frame_length_short() {
        let mut out = Vec::new();
        write_frame_length(&mut out, 100);
        assert_eq!(out, vec![100]);
    }

    #[test]
    fn test_write_frame_length_long_round_trips_via_parse_size() {
        let mut out = Vec::new();
        write_frame_length(&mut out, 300);
        out.push(0xAA);
        let packet = {
            let mut p = vec![0x02u8];
            p.extend_from_slice(&out);
            p
        };
        let layout = FrameLayout::parse(&packet, false).unwrap();
        assert_eq!(layout.sizes[0], 300);
    }
}
