//! Encoder errors.

/// Errors thrown by the encoder.
#[derive(Debug)]
pub enum EncoderError {
    /// A configuration or call argument was out of range.
    BadArguments(&'static str),
    /// A channel count was zero, exceeded 255, or didn't match the encoder
    /// it was given to.
    InvalidChannels,
    /// A stream count was zero or exceeded 255.
    InvalidStreams,
    /// The coupled-stream count exceeded the stream count.
    InvalidCoupledStreams,
    /// The total number of encoded channels (streams + coupled streams)
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
    /// The output buffer is too small to hold the encoded packet.
    BufferFull,
    /// An internal encoder error.
    InternalError(&'static str),
}

impl std::fmt::Display for EncoderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncoderError::BadArguments(message) => {
                write!(f, "{}", message)
            }
            EncoderError::InvalidChannels => {
                write!(f, "invalid channel count")
            }
            EncoderError::InvalidStreams => {
                write!(f, "invalid stream count")
            }
            EncoderError::InvalidCoupledStreams => {
                write!(f, "coupled-stream count exceeds stream count")
            }
            EncoderError::TooManyChannels => {
                write!(f, "too many encoded channels")
            }
            EncoderError::InvalidMapping => {
                write!(f, "invalid channel-mapping table")
            }
            EncoderError::InvalidLayout => {
                write!(f, "invalid ambisonic channel layout")
            }
            EncoderError::InvalidProjectionMatrix => {
                write!(f, "invalid demixing/projection matrix")
            }
            EncoderError::BufferFull => {
                write!(f, "output buffer is too small")
            }
            EncoderError::InternalError(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for EncoderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}
