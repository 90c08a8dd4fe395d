//! Implement the Opus encoder.
//!
//! Bit-exactness on the encode side isn't required (only the decoder must
//! match the reference bit-for-bit); this always drives the CELT leg at
//! fullband, writing a single-frame, non-self-delimited packet. SILK and
//! hybrid mode are opaque externals and are never selected here.

use crate::celt::CeltEncoder;
use crate::encoder_error::EncoderError;
use crate::range_coder::RangeEncoder;
use crate::{Channels, SamplingRate};

/// Configures the encoder on creation.
#[derive(Clone, Debug)]
pub struct EncoderConfiguration {
    /// Sample rate of the input signal (Hz). Default: 48000 Hz.
    pub sampling_rate: SamplingRate,
    /// Number of channels of the input signal. Default: Stereo.
    pub channels: Channels,
}

impl Default for EncoderConfiguration {
    fn default() -> Self {
        Self {
            sampling_rate: SamplingRate::Hz48000,
            channels: Channels::Stereo,
        }
    }
}

/// Opus encoder.
#[derive(Clone, Debug)]
pub struct Encoder {
    celt_enc: CeltEncoder,
    channels: Channels,
    sampling_rate: SamplingRate,
}

impl Encoder {
    /// Creates a new `Encoder` with the given configuration.
    pub fn new(configuration: &EncoderConfiguration) -> Result<Self, EncoderError> {
        let celt_enc = CeltEncoder::new(configuration.sampling_rate, configuration.channels)?;
        Ok(Self {
            celt_enc,
            channels: configuration.channels,
            sampling_rate: configuration.sampling_rate,
        })
    }

    /// Resets the encoder to be equivalent to a freshly initialized encoder.
    pub fn reset(&mut self) -> Result<(), EncoderError> {
        self.celt_enc.reset()
    }

    /// Returns the sampling rate the encoder was initialized with.
    pub fn sampling_rate(&self) -> SamplingRate {
        self.sampling_rate
    }

    /// Returns the channels the encoder was initialized with.
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Encodes one frame of `frame_size` samples per channel (interleaved if
    /// stereo) from `input` into `output`, returning the number of bytes
    /// written.
    ///
    /// `frame_size` must be one of 120, 240, 480 or 960 samples (2.5, 5, 10
    /// or 20 ms at 48 kHz); larger Opus frame sizes are assembled by the
    /// caller as multiple packets.
    pub fn encode_float(
        &mut self,
        input: &[f32],
        frame_size: usize,
        output: &mut [u8],
    ) -> Result<usize, EncoderError> {
        let lm = lm_for_frame_size(frame_size)?;
        if output.is_empty() {
            return Err(EncoderError::BufferFull);
        }

        let config = 28 + lm as u8;
        let stereo_bit = if self.channels == Channels::Stereo { 0x4 } else { 0 };
        output[0] = (config << 3) | stereo_bit;

        let total_bits = ((output.len() - 1) as u32) * 8;
        let mut enc = RangeEncoder::new(&mut output[1..]);
        self.celt_enc.encode(&mut enc, input, frame_size, total_bits)?;
        enc.done()?;

        Ok(1 + enc.range_bytes())
    }
}

fn lm_for_frame_size(frame_size: usize) -> Result<usize, EncoderError> {
    match frame_size {
        120 => Ok(0),
        240 => Ok(1),
        480 => Ok(2),
        960 => Ok(3),
        _ => Err(EncoderError::BadArguments(
            "frame size must be 120, 240, 480 or 960 samples",
        )),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{query_packet_bandwidth, query_packet_codec_mode, Bandwidth, CodecMode};

    #[test]
    fn test_encode_float_produces_parseable_celt_packet() {
        let config = EncoderConfiguration {
            channels: Channels::Mono,
            ..EncoderConfiguration::default()
        };
        let mut encoder = Encoder::new(&config).unwrap();
        let input: Vec<f32> = (0..120).map(|i| (i as f32 * 0.3).sin() * 0.4).collect();
        let mut output = [0u8; 1024];

        let written = encoder.encode_float(&input, 120, &mut output).unwrap();
        assert!(written > 1);

        let packet = &output[..written];
        assert_eq!(query_packet_codec_mode(packet), CodecMode::Celt);
        assert_eq!(query_packet_bandwidth(packet), Bandwidth::Fullband);
    }

    #[test]
    fn test_encode_float_rejects_unsupported_frame_size() {
        let mut encoder = Encoder::new(&EncoderConfiguration::default()).unwrap();
        let input = vec![0f32; 100];
        let mut output = [0u8; 64];
        assert!(encoder.encode_float(&input, 100, &mut output).is_err());
    }
}
