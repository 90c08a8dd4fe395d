//! Implements the Silk decoder.
//!
//! SILK mode is treated as an opaque external leg here: packets routed to it
//! decode to silence of the correct duration rather than running the SILK
//! synthesis pipeline.

use crate::range_coder::RangeDecoder;
use crate::{Channels, DecoderError, SamplingRate};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum LostFlag {
    /// No packet loss.
    NoLoss,
    /// Packet loss.
    Loss,
    /// Forward correction.
    DecodeFec,
}

/// The Silk decoder.
#[derive(Clone, Debug)]
pub(crate) struct SilkDecoder {
    sampling_rate: SamplingRate,
    channels: Channels,
    internal_sampling_rate: SamplingRate,
    internal_channels: Channels,
    payload_size_ms: usize,
    last_pitch: u32,
}

impl SilkDecoder {
    /// Creates a new Silk decoder. Configures the output sampling rate and output channels.
    pub(crate) fn new(
        sampling_rate: SamplingRate,
        channels: Channels,
    ) -> Result<Self, DecoderError> {
        Ok(Self {
            sampling_rate,
            channels,
            internal_sampling_rate: SamplingRate::Hz48000,
            internal_channels: Channels::Stereo,
            payload_size_ms: 0,
            last_pitch: 0,
        })
    }

    /// Resets the Silk decoder.
    pub(crate) fn reset(&mut self) -> Result<(), DecoderError> {
        self.internal_sampling_rate = SamplingRate::Hz48000;
        self.internal_channels = Channels::Stereo;
        self.payload_size_ms = 0;
        self.last_pitch = 0;
        Ok(())
    }

    /// Gets the pitch of the last decoded frame.
    pub(crate) fn pitch(&self) -> u32 {
        self.last_pitch
    }

    /// Sets the internal channels.
    pub(crate) fn set_internal_channels(&mut self, internal_channels: Channels) {
        self.internal_channels = internal_channels;
    }

    /// Sets the sampling rate.
    pub(crate) fn set_internal_sampling_rate(&mut self, sampling_rate: SamplingRate) {
        self.internal_sampling_rate = sampling_rate;
    }

    /// Sets the payload size in ms.
    pub(crate) fn set_payload_size_ms(&mut self, payload_size_ms: usize) {
        self.payload_size_ms = payload_size_ms;
    }

    /// Decodes one SILK frame. As the SILK leg is opaque here, this always
    /// produces silence of `frame_size` samples per channel and consumes no
    /// bits from `dec`.
    pub(crate) fn decode(
        &mut self,
        _dec: &mut Option<RangeDecoder>,
        samples: &mut [f32],
        frame_size: &mut usize,
        _lost_flag: LostFlag,
        _first_frame: bool,
    ) -> Result<(), DecoderError> {
        let n = *frame_size * self.channels as usize;
        if samples.len() < n {
            return Err(DecoderError::BufferToSmall);
        }
        samples[..n].iter_mut().for_each(|v| *v = 0.0);
        self.last_pitch = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_decode_produces_silence_of_requested_length() {
        let mut decoder = SilkDecoder::new(SamplingRate::Hz48000, Channels::Mono).unwrap();
        let mut samples = vec![1.0f32; 480];
        let mut frame_size = 480;
        let mut dec = None;
        decoder
            .decode(&mut dec, &mut samples, &mut frame_size, LostFlag::NoLoss, true)
            .unwrap();
        assert!(samples.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_reset_clears_pitch() {
        let mut decoder = SilkDecoder::new(SamplingRate::Hz48000, Channels::Stereo).unwrap();
        decoder.last_pitch = 42;
        decoder.reset().unwrap();
        assert_eq!(decoder.pitch(), 0);
    }
}
