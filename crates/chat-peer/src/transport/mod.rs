//! Transport collaborator
//!
//! The peer-connection layer is external; this module defines the seam the
//! chat core talks through plus an in-process hub used by tests and the demo.

mod error;
mod local_hub;

pub use error::{TransportError, TransportResult};
pub use local_hub::{HubLink, LocalHub};

use chat_core::{Envelope, InboundFrame, User};
use std::fmt;
use tokio::sync::mpsc;

/// Identifies one registered inbound handler on a hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Create from a raw value
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Inbound event stream for one subscription
///
/// Frames from a single sender arrive in the order that sender broadcast them.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub inbound: mpsc::UnboundedReceiver<InboundFrame>,
}

/// Peer transport: local identity, broadcast, and inbound event subscription
pub trait Transport: Send + Sync {
    /// The local identity, stable for the session
    fn local_user(&self) -> &User;

    /// Send an envelope to every connected peer (fire-and-forget)
    fn broadcast(&self, envelope: &Envelope) -> TransportResult<()>;

    /// Register for inbound frames
    fn subscribe(&self) -> TransportResult<Subscription>;

    /// Stop deliveries for `id` and free its resources; unknown ids are ignored
    fn unsubscribe(&self, id: SubscriptionId);
}
