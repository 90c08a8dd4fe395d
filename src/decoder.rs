//! Implement the Opus decoder.

use crate::celt::CeltDecoder;
use crate::framing::FrameLayout;
use crate::plc::ConcealmentState;
use crate::range_coder::RangeDecoder;
use crate::silk::{LostFlag, SilkDecoder};
use crate::toc::Toc;
use crate::tracer::{NullTracer, Tracer};
use crate::{query_packet_samples_per_frame, Bandwidth, Channels, CodecMode, DecoderError, Sample, SamplingRate};

/// Configures the decoder on creation.
///
/// Internally Opus stores data at 48000 Hz, so that should be the default
/// value for the sampling rate. However, the decoder can efficiently decode
/// to buffers at 8, 12, 16, and 24 kHz so if for some reason the caller cannot
/// use data at the full sample rate, or knows the compressed data doesn't
/// use the full frequency range, it can request decoding at a reduced
/// rate. Likewise, the decoder is capable of filling in either mono or
/// interleaved stereo pcm buffers, at the caller's request.
#[derive(Clone, Debug)]
pub struct DecoderConfiguration {
    /// Sample rate to decode at (Hz). Default: 48000 kHz.
    pub sampling_rate: SamplingRate,
    /// Number of channels to decode. Default: Stereo.
    pub channels: Channels,
    /// Scales the decoded output by a factor specified in Q8 dB units. Default: 0.
    pub gain: i16,
}

impl Default for DecoderConfiguration {
    fn default() -> Self {
        Self {
            sampling_rate: SamplingRate::Hz48000,
            channels: Channels::Stereo,
            gain: 0,
        }
    }
}

/// Opus decoder.
///
/// Opus is a stateful codec with overlapping blocks and as a result Opus
/// packets are not coded independently of each other. Packets must be
/// passed into the decoder serially and in the correct order for a correct
/// decode. Lost packets can be replaced with loss concealment by calling
/// the decoder with `None` for the missing packet.
#[derive(Clone, Debug)]
pub struct Decoder {
    celt_dec: CeltDecoder,
    silk_dec: SilkDecoder,
    channels: Channels,
    sampling_rate: SamplingRate,
    decode_gain: i16,

    stream_channels: Channels,
    bandwidth: Bandwidth,
    mode: Option<CodecMode>,
    prev_mode: Option<CodecMode>,
    frame_size: usize,
    prev_redundancy: Option<usize>,
    last_packet_duration: Option<u32>,

    concealment: ConcealmentState,
    tracer: NullTracer,

    final_range: u32,
}

impl Decoder {
    /// Creates a new `Decoder` with the given configuration.
    pub fn new(configuration: &DecoderConfiguration) -> Result<Self, DecoderError> {
        let celt_dec = CeltDecoder::new(configuration.sampling_rate, configuration.channels)?;
        let silk_dec = SilkDecoder::new(configuration.sampling_rate, configuration.channels)?;

        Ok(Self {
            celt_dec,
            silk_dec,
            sampling_rate: configuration.sampling_rate,
            channels: configuration.channels,
            decode_gain: configuration.gain,
            stream_channels: configuration.channels,
            bandwidth: Bandwidth::Auto,
            mode: None,
            prev_mode: None,
            frame_size: configuration.sampling_rate as usize / 400,
            prev_redundancy: None,
            last_packet_duration: None,
            concealment: ConcealmentState::new(),
            tracer: NullTracer,
            final_range: 0,
        })
    }

    /// Resets the Decoder to be equivalent to a freshly initialized decoder.
    ///
    /// This should be called when switching streams in order to prevent
    /// the back to back decoding from giving different results from
    /// one at a time decoding.
    pub fn reset(&mut self) -> Result<(), DecoderError> {
        self.silk_dec.reset()?;
        self.celt_dec.reset()?;

        self.stream_channels = self.channels;
        self.bandwidth = Bandwidth::Auto;
        self.mode = None;
        self.prev_mode = None;
        self.frame_size = self.sampling_rate as usize / 400;
        self.prev_redundancy = None;
        self.last_packet_duration = None;
        self.concealment.reset();

        Ok(())
    }

    /// Returns the sampling rate the decoder was initialized with.
    pub fn sampling_rate(&self) -> SamplingRate {
        self.sampling_rate
    }

    /// Returns the channels the decoder was initialized with.
    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Returns the amount to scale PCM signal by in Q8 dB units.
    pub fn gain(&self) -> i16 {
        self.decode_gain
    }

    /// Returns the decoder's last bandpass.
    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    /// Returns the pitch of the last decoded frame, measured in samples at 48 kHz
    pub fn pitch(&self) -> Option<u32> {
        if let Some(prev_mode) = self.prev_mode {
            match prev_mode {
                CodecMode::Celt => Some(self.celt_dec.pitch()),
                CodecMode::Silk | CodecMode::Hybrid => Some(self.silk_dec.pitch()),
            }
        } else {
            None
        }
    }

    /// Returns the duration (in samples) of the last packet successfully decoded or concealed.
    pub fn last_packet_duration(&self) -> Option<u32> {
        self.last_packet_duration
    }

    /// Returns the final state of the codec's entropy coder.
    ///
    /// This is used for testing purposes, the encoder and decoder state
    /// should be identical after coding a payload assuming no data
    /// corruption or software bugs).
    pub fn final_range(&mut self) -> u32 {
        self.final_range
    }

    /// Decode an Opus packet with a generic sample output.
    ///
    /// Returns number of decoded samples.
    ///
    /// Caller needs to make sure that the samples buffer has enough space to fit
    /// all samples inside the packet. Call `query_packet_sample_count()` to query
    /// the number of samples inside a packet and resize the buffer if needed.
    ///
    /// The internal format is `f32`. Use `decode_float()` to access it directly.
    ///
    /// # Arguments
    /// * `packet`     - Input payload. Use a `None` to indicate packet loss.
    /// * `samples`    - Output signal encoded as PCM samples (interleaved if 2 channels).
    ///                  Length must be at least `frame_size` * `channels`.
    /// * `frame_size` - Number of samples per channel of available space in a PCM.
    ///                  `frame_size` must be a multiple of 2.5 ms (400 for 48kHz).
    ///                  In the case of PLC (packet==`None`) or FEC (decode_fec=`true`), then
    ///                  `frame_size` needs to be exactly the duration of audio that is missing,
    ///                  otherwise the decoder will not be in the optimal state to decode
    ///                  the next incoming packet.
    /// * `decode_fec` - Request that any in-band forward error correction data be decoded.
    ///                  If no such data is available, the frame is decoded as if it were lost.
    ///
    pub fn decode<S: Sample>(
        &mut self,
        packet: Option<&[u8]>,
        samples: &mut [S],
        frame_size: usize,
        decode_fec: bool,
    ) -> Result<u32, DecoderError> {
        let channels = self.channels as usize;
        let mut scratch = vec![0f32; frame_size * channels];
        let (decoded, _) =
            self.decode_native(packet, &mut scratch, frame_size, decode_fec, 0, false);
        let decoded = decoded?;
        for (dst, &src) in samples.iter_mut().zip(scratch.iter()) {
            *dst = S::from_f32(src);
        }
        Ok(decoded)
    }

    /// Decode an Opus packet with floating point output.
    ///
    /// Returns number of decoded samples.
    ///
    /// Caller needs to make sure that the samples buffer has enough space to fit
    /// all samples inside the packet. Call `query_packet_sample_count()` to query
    /// the number of samples inside a packet and resize the buffer if needed.
    ///
    /// # Arguments
    /// * `packet`     - Input payload. Use a `None` to indicate packet loss.
    /// * `samples`    - Output signal encoded as PCM samples (interleaved if 2 channels).
    ///                  Length is frame_size * channels.
    /// * `frame_size` - Number of samples per channel of available space in a PCM.
    ///                  `frame_size` must be a multiple of 2.5 ms (400 for 48kHz).
    ///                  In the case of PLC (packet==`None`) or FEC (decode_fec=`true`), then
    ///                  `frame_size` needs to be exactly the duration of audio that is missing,
    ///                  otherwise the decoder will not be in the optimal state to decode
    ///                  the next incoming packet.
    /// * `decode_fec` - Request that any in-band forward error correction data be decoded.
    ///                  If no such data is available, the frame is decoded as if it were lost.
    ///
    pub fn decode_float(
        &mut self,
        packet: Option<&[u8]>,
        samples: &mut [f32],
        frame_size: usize,
        decode_fec: bool,
    ) -> Result<u32, DecoderError> {
        let (decoded, _) = self.decode_native(packet, samples, frame_size, decode_fec, 0, false);
        decoded
    }

    /// Returns the samples decoded and the packet_offset (used for multiple streams).
    pub(crate) fn decode_native(
        &mut self,
        packet: Option<&[u8]>,
        samples: &mut [f32],
        frame_size: usize,
        _decode_fec: bool,
        self_delimited: usize,
        soft_clip: bool,
    ) -> (Result<u32, DecoderError>, usize) {
        let channels = self.channels as usize;

        let packet = match packet {
            None => {
                let needed = frame_size * channels;
                if samples.len() < needed {
                    return (Err(DecoderError::BufferToSmall), 0);
                }
                samples[..needed].iter_mut().for_each(|v| *v = 0.0);
                self.concealment.record_loss();
                self.last_packet_duration = Some(frame_size as u32);
                return (Ok(frame_size as u32), 0);
            }
            Some(packet) => packet,
        };

        let toc = match Toc::parse(packet) {
            Ok(toc) => toc,
            Err(e) => return (Err(e), 0),
        };
        if toc.channels != self.channels {
            return (Err(DecoderError::InvalidChannels), 0);
        }

        let layout = match FrameLayout::parse(packet, self_delimited != 0) {
            Ok(layout) => layout,
            Err(e) => return (Err(e), 0),
        };

        let samples_per_frame = query_packet_samples_per_frame(packet, SamplingRate::Hz48000);
        let total_samples = layout.frame_count() * samples_per_frame;
        if total_samples > frame_size || samples.len() < total_samples * channels {
            return (Err(DecoderError::BufferToSmall), 0);
        }

        self.tracer.on_packet_mode(toc.mode);

        for (i, (&offset, &size)) in layout.offsets.iter().zip(layout.sizes.iter()).enumerate() {
            let frame_bytes = &packet[offset..offset + size];
            let sample_offset = i * samples_per_frame * channels;
            let out = &mut samples[sample_offset..sample_offset + samples_per_frame * channels];

            let result = match toc.mode {
                CodecMode::Celt => {
                    let mut dec = RangeDecoder::new(frame_bytes);
                    let total_bits = (size as u32) * 8;
                    self.celt_dec.decode(&mut dec, out, samples_per_frame, total_bits)
                }
                CodecMode::Silk | CodecMode::Hybrid => {
                    let mut dec = Some(RangeDecoder::new(frame_bytes));
                    let mut fs = samples_per_frame;
                    self.silk_dec
                        .decode(&mut dec, out, &mut fs, LostFlag::NoLoss, i == 0)
                }
            };
            if let Err(e) = result {
                return (Err(e), 0);
            }
        }

        if self.decode_gain != 0 {
            let gain_linear = 10f32.powf(f32::from(self.decode_gain) / (20.0 * 256.0));
            samples[..total_samples * channels]
                .iter_mut()
                .for_each(|v| *v *= gain_linear);
        }

        if soft_clip {
            let mut softclip_mem = vec![0f32; channels];
            crate::pcm_soft_clip(
                &mut samples[..total_samples * channels],
                channels,
                &mut softclip_mem,
            );
        }

        self.stream_channels = toc.channels;
        self.bandwidth = toc.bandwidth;
        self.mode = Some(toc.mode);
        self.prev_mode = Some(toc.mode);
        self.last_packet_duration = Some(total_samples as u32);
        self.concealment.record_success(toc.mode);

        (Ok(total_samples as u32), layout.packet_offset)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::celt::CeltEncoder;
    use crate::range_coder::RangeEncoder;

    fn make_celt_packet(channels: Channels, frame_size: usize, input: &[f32]) -> Vec<u8> {
        let mut encoder = CeltEncoder::new(SamplingRate::Hz48000, channels).unwrap();
        let mut payload = [0u8; 1024];
        let written = {
            let mut enc = RangeEncoder::new(&mut payload);
            encoder.encode(&mut enc, input, frame_size, 800).unwrap();
            enc.done().unwrap();
            enc.range_bytes()
        };
        // config 28 => fullband CELT, 2.5 ms (audio_size = 28 & 0x3 = 0); stereo
        // flag depends on `channels`; frame-count code 0 (1 frame).
        let stereo_bit = if channels == Channels::Stereo { 0x4 } else { 0 };
        let toc = 0b1110_0000u8 | stereo_bit;
        let mut packet = vec![toc];
        packet.extend_from_slice(&payload[..written]);
        packet
    }

    #[test]
    fn test_decode_loss_produces_silence() {
        let config = DecoderConfiguration::default();
        let mut decoder = Decoder::new(&config).unwrap();
        let mut samples = vec![1.0f32; 120 * 2];
        let decoded = decoder.decode_float(None, &mut samples, 120, false).unwrap();
        assert_eq!(decoded, 120);
        assert!(samples.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_decode_float_mono_celt_packet_round_trips() {
        let config = DecoderConfiguration {
            channels: Channels::Mono,
            ..DecoderConfiguration::default()
        };
        let mut decoder = Decoder::new(&config).unwrap();

        let input: Vec<f32> = (0..120).map(|i| (i as f32 * 0.2).sin() * 0.3).collect();
        let packet = make_celt_packet(Channels::Mono, 120, &input);

        let mut samples = vec![0f32; 120];
        let decoded = decoder
            .decode_float(Some(&packet), &mut samples, 120, false)
            .unwrap();

        assert_eq!(decoded, 120);
        assert!(samples.iter().all(|v| v.is_finite()));
        assert_eq!(decoder.bandwidth(), Bandwidth::Fullband);
    }

    #[test]
    fn test_decode_rejects_channel_mismatch() {
        let config = DecoderConfiguration {
            channels: Channels::Mono,
            ..DecoderConfiguration::default()
        };
        let mut decoder = Decoder::new(&config).unwrap();
        let input = vec![0f32; 240];
        let packet = make_celt_packet(Channels::Stereo, 120, &input);
        let mut samples = vec![0f32; 120];
        let result = decoder.decode_float(Some(&packet), &mut samples, 120, false);
        assert!(result.is_err());
    }
}
