//! SILK is kept as an opaque external mode: the range-coder-level framing
//! and control flow is modeled so hybrid/hybrid-adjacent packets can be
//! routed and sized correctly, but no actual SILK synthesis is performed.
//! Packets carrying SILK or Hybrid payload decode as silence of the right
//! duration rather than failing, matching how a stub codec leg behaves.

mod decoder;
mod encoder;

pub(crate) use decoder::{LostFlag, SilkDecoder};
pub(crate) use encoder::SilkEncoder;
