//! # chat-peer
//!
//! Client-side chat logic layered on a peer-to-peer transport: a throttled
//! typing notifier, per-peer typing presence with automatic expiry, an
//! append-only message log, and the bridge that wires inbound frames to them.

pub mod messages;
pub mod presence;
pub mod session;
pub mod throttle;
pub mod transport;

pub use messages::MessageLog;
pub use presence::{PresenceTracker, TypingTimer};
pub use session::{ChatSession, EventRouter, SessionError, SessionResult};
pub use throttle::{throttle, ThrottleGate, Throttled};
pub use transport::{
    HubLink, LocalHub, Subscription, SubscriptionId, Transport, TransportError, TransportResult,
};
