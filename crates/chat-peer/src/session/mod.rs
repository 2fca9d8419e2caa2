//! Event hub bridge
//!
//! Subscribes to the transport, demultiplexes inbound envelopes into the
//! presence tracker and message log, and exposes the local speak/typing
//! actions.

mod bridge;
mod error;
mod router;

pub use bridge::ChatSession;
pub use error::{SessionError, SessionResult};
pub use router::EventRouter;
