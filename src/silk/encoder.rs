//! Implements the Silk encoder.
//!
//! Mirrors [`super::decoder::SilkDecoder`]: an opaque external leg. Encoding
//! a SILK frame here writes the one silence bit the CELT encoder would use
//! and nothing else, which a compliant decoder interprets as silence.

use crate::encoder_error::EncoderError;
use crate::range_coder::RangeEncoder;
use crate::{Channels, SamplingRate};

/// The Silk encoder.
#[derive(Clone, Debug)]
pub(crate) struct SilkEncoder {
    sampling_rate: SamplingRate,
    channels: Channels,
}

impl SilkEncoder {
    /// Creates a new Silk encoder.
    pub(crate) fn new(
        sampling_rate: SamplingRate,
        channels: Channels,
    ) -> Result<Self, EncoderError> {
        Ok(Self {
            sampling_rate,
            channels,
        })
    }

    /// Resets the Silk encoder.
    pub(crate) fn reset(&mut self) -> Result<(), EncoderError> {
        Ok(())
    }

    /// Encodes one SILK frame as silence.
    pub(crate) fn encode(&mut self, enc: &mut RangeEncoder) -> Result<(), EncoderError> {
        enc.encode_bit_logp(1, 15)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_encode_writes_silence_bit() {
        let mut encoder = SilkEncoder::new(SamplingRate::Hz48000, Channels::Mono).unwrap();
        let mut buf = [0u8; 16];
        let mut enc = RangeEncoder::new(&mut buf);
        encoder.encode(&mut enc).unwrap();
        enc.done().unwrap();
        assert!(enc.range_bytes() <= 2);
    }
}
