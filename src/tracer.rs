//! Optional per-instance decode/encode observer.
//!
//! Wiring a [`Tracer`] into a [`crate::Decoder`] or `Encoder` gives test
//! harnesses and bit-exactness checkers visibility into internal events
//! (which codec leg handled a frame, how many bits the range coder
//! consumed) without the library depending on any particular logging setup.
//! The default [`NullTracer`] costs nothing when tracing isn't needed.

use crate::CodecMode;

/// Observes decode events as they happen.
///
/// Implementations are free to log, record to a buffer for test assertions,
/// or ignore events entirely (see [`NullTracer`]).
pub(crate) trait Tracer {
    /// Called once per packet, after the codec mode has been determined.
    fn on_packet_mode(&mut self, mode: CodecMode) {
        let _ = mode;
    }

    /// Called after a frame is decoded, with the number of range-coder bits
    /// consumed (`tell()` at the end of the frame).
    fn on_frame_decoded(&mut self, bits_consumed: u32) {
        let _ = bits_consumed;
    }

    /// Called when packet loss concealment runs instead of a real decode.
    fn on_concealment(&mut self, consecutive_losses: u32) {
        let _ = consecutive_losses;
    }
}

/// A [`Tracer`] that discards every event; the default for [`crate::Decoder`].
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NullTracer;

impl Tracer for NullTracer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTracer {
        modes: Vec<CodecMode>,
        losses: Vec<u32>,
    }

    impl Tracer for RecordingTracer {
        fn on_packet_mode(&mut self, mode: CodecMode) {
            self.modes.push(mode);
        }

        fn on_concealment(&mut self, consecutive_losses: u32) {
            self.losses.push(consecutive_losses);
        }
    }

    #[test]
    fn test_null_tracer_ignores_events() {
        let mut tracer = NullTracer;
        tracer.on_packet_mode(CodecMode::Celt);
        tracer.on_frame_decoded(42);
        tracer.on_concealment(1);
    }

    #[test]
    fn test_recording_tracer_captures_events() {
        let mut tracer = RecordingTracer::default();
        tracer.on_packet_mode(CodecMode::Silk);
        tracer.on_concealment(3);
        assert_eq!(tracer.modes, vec![CodecMode::Silk]);
        assert_eq!(tracer.losses, vec![3]);
    }
}
