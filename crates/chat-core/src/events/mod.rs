//! Wire envelopes and session events
//!
//! The envelope is the only payload peers exchange; session events are what a
//! session publishes to whoever renders it.

mod envelope;
mod session_event;

pub use envelope::{Envelope, EnvelopeKind, InboundFrame};
pub use session_event::SessionEvent;
