//! Packet-loss concealment state.
//!
//! When [`crate::Decoder::decode`] / `decode_float` is called with `packet =
//! None`, the CELT/SILK legs synthesize a replacement frame from their own
//! persistent state (band energies, history) rather than consulting this
//! module directly; what's tracked here is the cross-packet bookkeeping the
//! top-level decoder needs to decide how much concealment to ask for and to
//! report it back to the caller (`last_packet_duration`, consecutive-loss
//! count for fade-out).
use crate::CodecMode;

/// Tracks consecutive packet loss across calls to the decoder.
#[derive(Clone, Debug, Default)]
pub(crate) struct ConcealmentState {
    consecutive_losses: u32,
    last_mode: Option<CodecMode>,
}

impl ConcealmentState {
    /// Creates a fresh, loss-free state.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Resets the state, as on decoder reset.
    pub(crate) fn reset(&mut self) {
        self.consecutive_losses = 0;
        self.last_mode = None;
    }

    /// Records a successfully decoded packet in `mode`.
    pub(crate) fn record_success(&mut self, mode: CodecMode) {
        self.consecutive_losses = 0;
        self.last_mode = Some(mode);
    }

    /// Records a lost or concealed frame, returning the number of
    /// consecutive losses including this one.
    pub(crate) fn record_loss(&mut self) -> u32 {
        self.consecutive_losses = self.consecutive_losses.saturating_add(1);
        self.consecutive_losses
    }

    /// Mode to use for concealment, i.e. the mode of the last successfully
    /// decoded packet, if any.
    pub(crate) fn concealment_mode(&self) -> Option<CodecMode> {
        self.last_mode
    }

    /// Whether concealment has run long enough that the decoder should fade
    /// the synthesized signal towards silence rather than extrapolate it
    /// indefinitely.
    pub(crate) fn should_fade_to_silence(&self) -> bool {
        self.consecutive_losses > 5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_count_increments_and_resets() {
        let mut state = ConcealmentState::new();
        assert_eq!(state.record_loss(), 1);
        assert_eq!(state.record_loss(), 2);
        state.record_success(CodecMode::Celt);
        assert_eq!(state.record_loss(), 1);
    }

    #[test]
    fn test_fade_to_silence_kicks_in_after_several_losses() {
        let mut state = ConcealmentState::new();
        for _ in 0..5 {
            state.record_loss();
        }
        assert!(!state.should_fade_to_silence());
        state.record_loss();
        assert!(state.should_fade_to_silence());
    }

    #[test]
    fn test_concealment_mode_tracks_last_success() {
        let mut state = ConcealmentState::new();
        assert_eq!(state.concealment_mode(), None);
        state.record_success(CodecMode::Silk);
        assert_eq!(state.concealment_mode(), Some(CodecMode::Silk));
    }
}
