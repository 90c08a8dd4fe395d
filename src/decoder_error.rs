//! Decoder errors.

/// Errors thrown by the decoder.
#[derive(Debug)]
pub enum DecoderError {
    /// The packet is malformed: a bad TOC byte, an inconsistent frame count,
    /// a length prefix that overruns the packet, or similar framing damage.
    InvalidPacket,
    /// The packet is too short to contain even a TOC byte, or is truncated
    /// partway through a length prefix.
    PacketTooShort,
    /// A multistream packet's sub-packets don't all encode the same frame
    /// duration.
    DurationMismatch,
    /// A channel count was zero, exceeded 255, or didn't match the decoder
    /// it was given to.
    InvalidChannels,
    /// A stream count was zero or exceeded 255.
    InvalidStreams,
    /// The coupled-stream count exceeded the stream count.
    InvalidCoupledStreams,
    /// The total number of decoded channels (streams + coupled streams)
    /// exceeded 255.
    TooManyChannels,
    /// A channel-mapping table had the wrong length or an out-of-range
    /// entry.
    InvalidMapping,
    /// An ambisonic channel count wasn't `(order+1)^2`, optionally plus a
    /// non-diegetic stereo pair.
    InvalidLayout,
    /// A mapping-family-3 demixing matrix had the wrong number of entries.
    InvalidProjectionMatrix,
    /// A packet-level argument was out of range (e.g. an unsupported channel
    /// mapping family or stream count).
    BadArguments(&'static str),
    /// The output buffer doesn't have room for the decoded samples.
    BufferToSmall,
    /// The bitstream was locally well-formed but internally inconsistent in
    /// a way that isn't covered by a more specific variant (e.g. a value
    /// that can only be produced by corrupting the coder's internal state).
    InternalProtocolError,
    /// An internal decoder error.
    InternalError(&'static str),
}

impl std::fmt::Display for DecoderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecoderError::InvalidPacket => {
                write!(f, "invalid packet")
            }
            DecoderError::PacketTooShort => {
                write!(f, "packet is too short")
            }
            DecoderError::DurationMismatch => {
                write!(f, "sub-packets do not share the same frame duration")
            }
            DecoderError::InvalidChannels => {
                write!(f, "invalid channel count")
            }
            DecoderError::InvalidStreams => {
                write!(f, "invalid stream count")
            }
            DecoderError::InvalidCoupledStreams => {
                write!(f, "coupled-stream count exceeds stream count")
            }
            DecoderError::TooManyChannels => {
                write!(f, "too many decoded channels")
            }
            DecoderError::InvalidMapping => {
                write!(f, "invalid channel-mapping table")
            }
            DecoderError::InvalidLayout => {
                write!(f, "invalid ambisonic channel layout")
            }
            DecoderError::InvalidProjectionMatrix => {
                write!(f, "invalid demixing/projection matrix")
            }
            DecoderError::BadArguments(message) => {
                write!(f, "{}", message)
            }
            DecoderError::BufferToSmall => {
                write!(f, "output buffer is too small")
            }
            DecoderError::InternalProtocolError => {
                write!(f, "internal protocol error")
            }
            DecoderError::InternalError(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for DecoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
