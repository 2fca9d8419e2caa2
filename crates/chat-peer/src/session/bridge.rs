//! Chat session
//!
//! Owns the message log for the lifetime of the session and one attachment
//! per hub: the subscription, the inbound pump task, the presence tracker and
//! the typing throttle. Changing hubs releases the old attachment before the
//! new one is created.

use super::{EventRouter, SessionResult};
use crate::messages::MessageLog;
use crate::presence::PresenceTracker;
use crate::throttle::{throttle, Throttled};
use crate::transport::{SubscriptionId, Transport};
use chat_common::PresenceConfig;
use chat_core::{Envelope, InboundFrame, Message, SessionEvent, User, UserId};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

type TypingNotifier = Throttled<Box<dyn Fn() + Send + Sync>>;

/// Resources acquired by one subscription to one hub
struct Attachment {
    transport: Arc<dyn Transport>,
    subscription_id: SubscriptionId,
    tracker: Arc<PresenceTracker>,
    notify_typing: TypingNotifier,
    pump: JoinHandle<()>,
}

impl Attachment {
    /// Undo everything `ChatSession::attach` set up
    ///
    /// Aborting the pump does not interrupt a frame already being routed on
    /// another worker; the router re-checks the closed tracker before
    /// appending, which leaves only the append itself racing with release.
    fn release(self) {
        self.transport.unsubscribe(self.subscription_id);
        self.pump.abort();
        self.tracker.teardown();

        tracing::debug!(
            user_id = %self.transport.local_user().id,
            subscription = %self.subscription_id,
            "Hub attachment released"
        );
    }
}

/// A local user's chat session on top of a peer transport
pub struct ChatSession {
    config: PresenceConfig,
    local_user: User,
    log: Arc<MessageLog>,
    events: broadcast::Sender<SessionEvent>,
    attachment: Option<Attachment>,
}

impl ChatSession {
    /// Subscribe to `transport` and start processing inbound events
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(transport: Arc<dyn Transport>, config: PresenceConfig) -> SessionResult<Self> {
        let (events, _) = broadcast::channel(config.event_buffer);

        let mut session = Self {
            config,
            local_user: transport.local_user().clone(),
            log: Arc::new(MessageLog::new()),
            events,
            attachment: None,
        };
        session.attach(transport)?;

        tracing::info!(user_id = %session.local_user.id, "Chat session started");

        Ok(session)
    }

    /// Switch to a different hub
    ///
    /// The current attachment is released first, cancelling every pending
    /// typing timer. The message log is kept. On error the session is left
    /// detached.
    pub fn rebind(&mut self, transport: Arc<dyn Transport>) -> SessionResult<()> {
        self.release();
        self.local_user = transport.local_user().clone();
        self.attach(transport)
    }

    /// Unsubscribe and cancel all pending timers; idempotent
    pub fn release(&mut self) {
        if let Some(attachment) = self.attachment.take() {
            attachment.release();
        }
    }

    /// Say something: broadcast it, then append it to the local log
    ///
    /// The local append happens even if the broadcast fails or the session
    /// is detached.
    pub fn speak(&self, content: impl Into<String>) -> Message {
        let content = content.into();

        match &self.attachment {
            Some(attachment) => {
                if let Err(e) = attachment.transport.broadcast(&Envelope::speak(content.clone())) {
                    tracing::warn!(
                        user_id = %self.local_user.id,
                        error = %e,
                        "Failed to broadcast message"
                    );
                }
            }
            None => {
                tracing::warn!(
                    user_id = %self.local_user.id,
                    "Speaking while detached, message stays local"
                );
            }
        }

        let message = self.log.append(self.local_user.clone(), content);
        let _ = self.events.send(SessionEvent::MessageAppended(message.clone()));
        message
    }

    /// Tell peers we are typing, at most once per typing send period
    ///
    /// Returns whether the throttle let the call through. A failed broadcast
    /// is logged and still counts as a pass.
    pub fn notify_typing(&self) -> bool {
        self.attachment
            .as_ref()
            .is_some_and(|attachment| attachment.notify_typing.call())
    }

    /// Get the ordered message log as of now
    pub fn messages(&self) -> Arc<Vec<Message>> {
        self.log.snapshot()
    }

    /// Get the peers currently typing
    pub fn typing_users(&self) -> HashSet<UserId> {
        self.attachment
            .as_ref()
            .map(|attachment| attachment.tracker.typing_users())
            .unwrap_or_default()
    }

    /// Check whether a peer is currently typing
    pub fn is_typing(&self, user_id: &UserId) -> bool {
        self.attachment
            .as_ref()
            .is_some_and(|attachment| attachment.tracker.is_typing(user_id))
    }

    /// Subscribe to session events
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Get the local identity
    pub fn local_user(&self) -> &User {
        &self.local_user
    }

    /// Get the presence tracker of the current attachment
    pub fn tracker(&self) -> Option<&Arc<PresenceTracker>> {
        self.attachment.as_ref().map(|attachment| &attachment.tracker)
    }

    /// Check if the session is subscribed to a hub
    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    fn attach(&mut self, transport: Arc<dyn Transport>) -> SessionResult<()> {
        let subscription = transport.subscribe()?;
        let tracker = PresenceTracker::new(self.config.typing_expiry, self.events.clone());
        let router = EventRouter::new(self.log.clone(), tracker.clone(), self.events.clone());

        let pump = tokio::spawn(pump_inbound(subscription.inbound, router));

        let notifier_transport = transport.clone();
        let send_typing: Box<dyn Fn() + Send + Sync> = Box::new(move || {
            if let Err(e) = notifier_transport.broadcast(&Envelope::typing()) {
                tracing::warn!(error = %e, "Failed to broadcast typing notification");
            }
        });
        let notify_typing: TypingNotifier = throttle(send_typing, self.config.typing_send_period);

        tracing::debug!(
            user_id = %self.local_user.id,
            subscription = %subscription.id,
            "Hub attachment created"
        );

        self.attachment = Some(Attachment {
            transport,
            subscription_id: subscription.id,
            tracker,
            notify_typing,
            pump,
        });

        Ok(())
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatSession")
            .field("local_user", &self.local_user.id)
            .field("messages", &self.log.len())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Feed inbound frames to the router in delivery order
async fn pump_inbound(mut inbound: mpsc::UnboundedReceiver<InboundFrame>, router: EventRouter) {
    while let Some(frame) = inbound.recv().await {
        router.dispatch(&frame);
    }
    tracing::debug!("Inbound stream ended");
}
