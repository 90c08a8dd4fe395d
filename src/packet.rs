//! Top-level packet router: demultiplexes a multistream Opus packet into its
//! component streams and routes each to its own [`Decoder`]/[`Encoder`],
//! mixing the decoded channels onto (or splitting the input channels from)
//! the application's output channels per the packet's [`ChannelMapping`].
//!
//! A single-stream packet (the overwhelmingly common case) never reaches
//! this module: callers use [`Decoder`]/[`Encoder`] directly. This module
//! exists for surround and ambisonic streams, where an Ogg container or
//! application hands over several self-delimited sub-packets glued
//! together (RFC 7845 section 5.1.1).

use crate::multistream::ChannelMapping;
use crate::{
    Channels, Decoder, DecoderConfiguration, DecoderError, Encoder, EncoderConfiguration,
    EncoderError, SamplingRate,
};

/// Decodes a multistream Opus packet (RFC 7845 section 5.1.1) into
/// interleaved output channels.
#[derive(Debug)]
pub struct MultistreamDecoder {
    decoders: Vec<Decoder>,
    mapping: ChannelMapping,
    sampling_rate: SamplingRate,
}

impl MultistreamDecoder {
    fn from_mapping(
        sampling_rate: SamplingRate,
        mapping: ChannelMapping,
    ) -> Result<Self, DecoderError> {
        let mut decoders = Vec::with_capacity(mapping.streams);
        for i in 0..mapping.streams {
            let channels = if i < mapping.coupled_streams {
                Channels::Stereo
            } else {
                Channels::Mono
            };
            let configuration = DecoderConfiguration {
                sampling_rate,
                channels,
                gain: 0,
            };
            decoders.push(Decoder::new(&configuration)?);
        }
        Ok(Self {
            decoders,
            mapping,
            sampling_rate,
        })
    }

    /// Creates a multistream decoder for mapping family 0: a single mono or
    /// stereo stream, passed straight through.
    pub fn new_family_0(sampling_rate: SamplingRate, stereo: bool) -> Result<Self, DecoderError> {
        Self::from_mapping(sampling_rate, ChannelMapping::family_0(stereo))
    }

    /// Creates a multistream decoder for mapping family 1: the fixed Vorbis
    /// surround layouts for 1 to 8 channels (mono, stereo, 3.0, quad, 5.0,
    /// 5.1, 6.1, 7.1).
    pub fn new_family_1(
        sampling_rate: SamplingRate,
        channels: usize,
    ) -> Result<Self, DecoderError> {
        Self::from_mapping(sampling_rate, ChannelMapping::family_1(channels)?)
    }

    /// Creates a multistream decoder for mapping family 255: an explicit,
    /// application- or container-supplied channel mapping table.
    pub fn new_explicit(
        sampling_rate: SamplingRate,
        channels: usize,
        streams: usize,
        coupled_streams: usize,
        mapping: Vec<u8>,
    ) -> Result<Self, DecoderError> {
        Self::from_mapping(
            sampling_rate,
            ChannelMapping::explicit(channels, streams, coupled_streams, mapping)?,
        )
    }

    /// Creates a multistream decoder for mapping family 2: a plain
    /// ambisonic layout (`channels` must be `(order+1)^2`, optionally plus a
    /// non-diegetic stereo pair), one mono stream per ambisonic channel.
    pub fn new_ambisonic(
        sampling_rate: SamplingRate,
        channels: usize,
    ) -> Result<Self, DecoderError> {
        Self::from_mapping(sampling_rate, ChannelMapping::ambisonic(channels)?)
    }

    /// Creates a multistream decoder for mapping family 3: an ambisonic
    /// layout demixed from `streams` encoded streams (`coupled_streams` of
    /// them stereo) through a `channels` by `streams + coupled_streams`
    /// row-major projection matrix.
    pub fn new_ambisonic_projection(
        sampling_rate: SamplingRate,
        channels: usize,
        streams: usize,
        coupled_streams: usize,
        demix_matrix: Vec<f32>,
    ) -> Result<Self, DecoderError> {
        Self::from_mapping(
            sampling_rate,
            ChannelMapping::ambisonic_projection(channels, streams, coupled_streams, demix_matrix)?,
        )
    }

    /// Number of output channels this decoder produces.
    pub fn channels(&self) -> usize {
        self.mapping.channels
    }

    /// Returns the sampling rate the decoder was initialized with.
    pub fn sampling_rate(&self) -> SamplingRate {
        self.sampling_rate
    }

    /// Resets every underlying per-stream decoder.
    pub fn reset(&mut self) -> Result<(), DecoderError> {
        for decoder in &mut self.decoders {
            decoder.reset()?;
        }
        Ok(())
    }

    /// Decodes one multistream packet into `samples` (interleaved,
    /// `mapping.channels` wide), `frame_size` samples per output channel.
    pub fn decode_float(
        &mut self,
        packet: &[u8],
        samples: &mut [f32],
        frame_size: usize,
    ) -> Result<u32, DecoderError> {
        let out_channels = self.mapping.channels;
        if samples.len() < frame_size * out_channels {
            return Err(DecoderError::BufferToSmall);
        }

        let decoded_channels = self.mapping.decoded_channels();
        let mut decoded = vec![0f32; frame_size * decoded_channels];
        let mut cursor = packet;
        let mut decoded_offset = 0;
        let mut expected_samples = None;

        let num_decoders = self.decoders.len();
        for (i, decoder) in self.decoders.iter_mut().enumerate() {
            let last_stream = i + 1 == num_decoders;
            // Every sub-packet but the last is self-delimited so its length
            // can be recovered without knowing the streams after it.
            let self_delimited = usize::from(!last_stream);
            let stream_channels = decoder.channels() as usize;

            let dst = &mut decoded[decoded_offset..decoded_offset + frame_size * stream_channels];
            let (result, packet_offset) =
                decoder.decode_native(Some(cursor), dst, frame_size, false, self_delimited, false);
            let stream_samples = result?;

            // All streams in a multistream packet must cover the same
            // duration; a stream that decoded a different number of samples
            // than the others means the packet is malformed.
            match expected_samples {
                None => expected_samples = Some(stream_samples),
                Some(expected) if expected != stream_samples => {
                    return Err(DecoderError::DurationMismatch);
                }
                _ => {}
            }

            decoded_offset += frame_size * stream_channels;
            if packet_offset > cursor.len() {
                return Err(DecoderError::InvalidPacket);
            }
            cursor = &cursor[packet_offset..];
        }

        self.mapping.mix(&decoded, frame_size, samples);

        Ok((frame_size * out_channels) as u32)
    }
}

/// Encodes interleaved input channels into a multistream Opus packet
/// (RFC 7845 section 5.1.1), the encode-side counterpart of
/// [`MultistreamDecoder`].
///
/// Every stream is encoded at the same, fixed bitrate share of the output
/// buffer; the per-stream weighting, LFE-channel flagging and
/// constrained-VBR burst control a fully spec-compliant multistream
/// encoder would apply are not implemented here (see the crate's design
/// notes).
#[derive(Debug)]
pub struct MultistreamEncoder {
    encoders: Vec<Encoder>,
    mapping: ChannelMapping,
}

impl MultistreamEncoder {
    fn from_mapping(
        sampling_rate: SamplingRate,
        mapping: ChannelMapping,
    ) -> Result<Self, EncoderError> {
        let mut encoders = Vec::with_capacity(mapping.streams);
        for i in 0..mapping.streams {
            let channels = if i < mapping.coupled_streams {
                Channels::Stereo
            } else {
                Channels::Mono
            };
            let configuration = EncoderConfiguration {
                sampling_rate,
                channels,
            };
            encoders.push(Encoder::new(&configuration)?);
        }
        Ok(Self { encoders, mapping })
    }

    /// Creates a multistream encoder for mapping family 0.
    pub fn new_family_0(sampling_rate: SamplingRate, stereo: bool) -> Result<Self, EncoderError> {
        Self::from_mapping(sampling_rate, ChannelMapping::family_0(stereo))
    }

    /// Creates a multistream encoder for mapping family 1 (1 to 8 channel
    /// fixed Vorbis surround layouts).
    pub fn new_family_1(
        sampling_rate: SamplingRate,
        channels: usize,
    ) -> Result<Self, EncoderError> {
        let mapping = ChannelMapping::family_1(channels).map_err(mapping_error_to_encoder)?;
        Self::from_mapping(sampling_rate, mapping)
    }

    /// Creates a multistream encoder for mapping family 255 (an explicit,
    /// caller-supplied channel mapping table).
    pub fn new_explicit(
        sampling_rate: SamplingRate,
        channels: usize,
        streams: usize,
        coupled_streams: usize,
        mapping: Vec<u8>,
    ) -> Result<Self, EncoderError> {
        let mapping = ChannelMapping::explicit(channels, streams, coupled_streams, mapping)
            .map_err(mapping_error_to_encoder)?;
        Self::from_mapping(sampling_rate, mapping)
    }

    /// Number of input channels this encoder expects.
    pub fn channels(&self) -> usize {
        self.mapping.channels
    }

    /// Resets every underlying per-stream encoder.
    pub fn reset(&mut self) -> Result<(), EncoderError> {
        for encoder in &mut self.encoders {
            encoder.reset()?;
        }
        Ok(())
    }

    /// Encodes one frame of interleaved `input` (`mapping.channels` wide,
    /// `frame_size` samples per channel) into `output`, returning the
    /// number of bytes written. Every stream but the last is written
    /// self-delimited so a decoder can demultiplex without look-ahead.
    pub fn encode_float(
        &mut self,
        input: &[f32],
        frame_size: usize,
        output: &mut [u8],
    ) -> Result<usize, EncoderError> {
        let in_channels = self.mapping.channels;
        if input.len() < frame_size * in_channels {
            return Err(EncoderError::BadArguments(
                "input buffer shorter than frame_size * channels",
            ));
        }

        let decoded_channels = self.mapping.decoded_channels();
        // Invert the output mapping: for each decoded (pre-mixing) channel,
        // find the one input channel that feeds it directly. Decoded
        // channels with no direct source (e.g. only reachable through a
        // mapping-family-3 projection matrix) are fed silence; full
        // inverse-projection encoding isn't implemented.
        let mut source = vec![None; decoded_channels];
        for ch in 0..in_channels {
            if let Some(decoded_ch) = self.mapping.source_channel(ch) {
                source[decoded_ch].get_or_insert(ch);
            }
        }

        let mut stream_input = vec![0f32; frame_size * decoded_channels];
        for t in 0..frame_size {
            for (d, src) in source.iter().enumerate() {
                stream_input[t * decoded_channels + d] = match src {
                    Some(ch) => input[t * in_channels + ch],
                    None => 0.0,
                };
            }
        }

        let mut written = 0;
        let mut decoded_offset = 0;
        let num_encoders = self.encoders.len();
        for (i, encoder) in self.encoders.iter_mut().enumerate() {
            let last_stream = i + 1 == num_encoders;
            let stream_channels = encoder.channels() as usize;

            let mut deinterleaved = vec![0f32; frame_size * stream_channels];
            for t in 0..frame_size {
                let src = &stream_input
                    [t * decoded_channels + decoded_offset..t * decoded_channels + decoded_offset + stream_channels];
                deinterleaved[t * stream_channels..(t + 1) * stream_channels].copy_from_slice(src);
            }
            decoded_offset += stream_channels;

            if written >= output.len() {
                return Err(EncoderError::BufferFull);
            }
            let dst = &mut output[written..];
            let stream_bytes = encoder.encode_float(&deinterleaved, frame_size, dst)?;

            if last_stream {
                written += stream_bytes;
            } else {
                // Re-frame as self-delimited: TOC byte, then a length
                // prefix for the payload, then the payload.
                let mut framed = Vec::with_capacity(stream_bytes + 2);
                framed.push(dst[0]);
                crate::framing::write_frame_length(&mut framed, stream_bytes - 1);
                framed.extend_from_slice(&dst[1..stream_bytes]);
                if framed.len() > output.len() - written {
                    return Err(EncoderError::BufferFull);
                }
                output[written..written + framed.len()].copy_from_slice(&framed);
                written += framed.len();
            }
        }

        Ok(written)
    }
}

/// Translates a [`ChannelMapping`] construction error (`DecoderError`,
/// since the mapping is shared between the decode and encode sides) into
/// the matching [`EncoderError`] variant.
fn mapping_error_to_encoder(error: DecoderError) -> EncoderError {
    match error {
        DecoderError::InvalidChannels => EncoderError::InvalidChannels,
        DecoderError::InvalidStreams => EncoderError::InvalidStreams,
        DecoderError::InvalidCoupledStreams => EncoderError::InvalidCoupledStreams,
        DecoderError::TooManyChannels => EncoderError::TooManyChannels,
        DecoderError::InvalidMapping => EncoderError::InvalidMapping,
        DecoderError::InvalidLayout => EncoderError::InvalidLayout,
        DecoderError::InvalidProjectionMatrix => EncoderError::InvalidProjectionMatrix,
        _ => EncoderError::BadArguments("invalid channel mapping"),
    }
}
