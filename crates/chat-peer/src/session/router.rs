//! Inbound envelope router
//!
//! Decodes inbound frames and dispatches them by envelope type.

use crate::messages::MessageLog;
use crate::presence::PresenceTracker;
use chat_core::{Envelope, EnvelopeKind, InboundFrame, SessionEvent, User};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Routes inbound envelopes to the presence tracker and message log
#[derive(Debug, Clone)]
pub struct EventRouter {
    log: Arc<MessageLog>,
    tracker: Arc<PresenceTracker>,
    events: broadcast::Sender<SessionEvent>,
}

impl EventRouter {
    /// Create a router over one attachment's tracker and the session log
    pub fn new(
        log: Arc<MessageLog>,
        tracker: Arc<PresenceTracker>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            log,
            tracker,
            events,
        }
    }

    /// Decode and dispatch one inbound frame
    ///
    /// Malformed payloads are dropped. Frames arriving after the attachment
    /// was released are dropped too.
    pub fn dispatch(&self, frame: &InboundFrame) {
        if self.tracker.is_closed() {
            tracing::trace!(source = %frame.source.id, "Frame after release, ignoring");
            return;
        }

        let envelope = match frame.envelope() {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(
                    source = %frame.source.id,
                    error = %e,
                    "Received malformed frame, ignoring"
                );
                return;
            }
        };

        self.route(&frame.source, envelope);
    }

    /// Dispatch an already decoded envelope from `source`
    pub fn route(&self, source: &User, envelope: Envelope) {
        tracing::trace!(
            source = %source.id,
            kind = %envelope.kind,
            "Dispatching envelope"
        );

        match envelope.kind {
            EnvelopeKind::Speak => {
                // Release may have happened while this frame was in flight
                if self.tracker.is_closed() {
                    tracing::trace!(source = %source.id, "Speak after release, ignoring");
                    return;
                }
                let message = self.log.append(source.clone(), envelope.content);
                let _ = self.events.send(SessionEvent::MessageAppended(message));
                // A message ends typing
                self.tracker.on_speak(source);
            }
            EnvelopeKind::Typing => {
                self.tracker.on_typing_signal(source);
            }
            EnvelopeKind::Unknown(tag) => {
                tracing::debug!(
                    source = %source.id,
                    kind = %tag,
                    "Received unknown envelope type, ignoring"
                );
            }
        }
    }
}
