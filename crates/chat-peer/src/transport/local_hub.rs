//! In-process hub
//!
//! Connects any number of local peers. Every broadcast is encoded to the JSON
//! wire format and fanned out to the subscriptions of every *other* peer, so
//! decoding runs exactly as it would over a real link.

use super::{Subscription, SubscriptionId, Transport, TransportError, TransportResult};
use chat_core::{Envelope, InboundFrame, User, UserId};
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A registered inbound handler
struct Subscriber {
    user_id: UserId,
    sender: mpsc::UnboundedSender<InboundFrame>,
}

/// In-process broadcast hub
///
/// Uses `DashMap` for concurrent access to subscriber state.
pub struct LocalHub {
    /// Active subscriptions by id
    subscribers: DashMap<SubscriptionId, Subscriber>,
    /// Source of subscription ids
    next_id: AtomicU64,
    /// Whether the hub has been shut down
    closed: AtomicBool,
}

impl LocalHub {
    /// Create a new hub wrapped in Arc
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        })
    }

    /// Connect a peer; the returned link is that peer's transport
    pub fn join(self: &Arc<Self>, user: User) -> Arc<HubLink> {
        tracing::debug!(user_id = %user.id, "Peer joined hub");
        Arc::new(HubLink {
            hub: self.clone(),
            user,
        })
    }

    /// Deliver a raw payload from `source` to every other peer's subscriptions
    ///
    /// The payload is not validated, which makes this the way to inject
    /// malformed or future-version frames. Returns the number of deliveries.
    pub fn deliver_raw(&self, source: &User, payload: &str) -> usize {
        if self.is_closed() {
            return 0;
        }

        let mut sent = 0;
        let mut gone = Vec::new();

        for entry in self.subscribers.iter() {
            if entry.user_id == source.id {
                continue;
            }

            let frame = InboundFrame::new(source.clone(), payload);
            if entry.sender.send(frame).is_ok() {
                sent += 1;
            } else {
                gone.push(*entry.key());
            }
        }

        // Receivers dropped without unsubscribing
        for id in gone {
            self.subscribers.remove(&id);
        }

        tracing::trace!(source = %source.id, sent, "Frame delivered");

        sent
    }

    /// Get the number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Shut the hub down
    ///
    /// Drops every subscription (ending their inbound streams); later
    /// broadcasts and subscribes fail with [`TransportError::HubClosed`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.subscribers.clear();
        tracing::info!("Hub closed");
    }

    /// Check if the hub has been shut down
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn register(&self, user_id: &UserId) -> TransportResult<Subscription> {
        if self.is_closed() {
            return Err(TransportError::HubClosed);
        }

        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (sender, inbound) = mpsc::unbounded_channel();
        self.subscribers.insert(
            id,
            Subscriber {
                user_id: user_id.clone(),
                sender,
            },
        );

        tracing::debug!(user_id = %user_id, subscription = %id, "Subscription added");

        Ok(Subscription { id, inbound })
    }

    fn remove(&self, id: SubscriptionId) {
        if self.subscribers.remove(&id).is_some() {
            tracing::debug!(subscription = %id, "Subscription removed");
        }
    }
}

impl fmt::Debug for LocalHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalHub")
            .field("subscribers", &self.subscribers.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// One peer's connection to a [`LocalHub`]
pub struct HubLink {
    hub: Arc<LocalHub>,
    user: User,
}

impl HubLink {
    /// Get the hub this link belongs to
    pub fn hub(&self) -> &Arc<LocalHub> {
        &self.hub
    }
}

impl Transport for HubLink {
    fn local_user(&self) -> &User {
        &self.user
    }

    fn broadcast(&self, envelope: &Envelope) -> TransportResult<()> {
        if self.hub.is_closed() {
            return Err(TransportError::HubClosed);
        }

        let payload = envelope.encode()?;
        self.hub.deliver_raw(&self.user, &payload);
        Ok(())
    }

    fn subscribe(&self) -> TransportResult<Subscription> {
        self.hub.register(&self.user.id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.hub.remove(id);
    }
}

impl fmt::Debug for HubLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubLink")
            .field("user", &self.user.id)
            .finish()
    }
}
