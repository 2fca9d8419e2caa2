//! Test helpers for integration tests
//!
//! Provides a multi-peer harness over [`LocalHub`] and utilities for driving
//! the paused Tokio clock.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chat_common::PresenceConfig;
use chat_core::{SessionEvent, User};
use chat_peer::{ChatSession, HubLink, LocalHub, Transport};
use tokio::sync::broadcast;

use crate::fixtures::test_user;

/// One peer connected to the test hub
pub struct TestPeer {
    pub user: User,
    pub link: Arc<HubLink>,
    pub session: ChatSession,
    pub events: broadcast::Receiver<SessionEvent>,
}

impl TestPeer {
    /// Drain every event received so far
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Contents of the session log, in order
    pub fn contents(&self) -> Vec<String> {
        self.session
            .messages()
            .iter()
            .map(|m| m.content.clone())
            .collect()
    }
}

/// A hub with any number of peers
pub struct TestHub {
    pub hub: Arc<LocalHub>,
    pub config: PresenceConfig,
}

impl TestHub {
    /// Create a hub using the production timings
    pub fn new() -> Self {
        Self::with_config(PresenceConfig::default())
    }

    /// Create a hub with custom timings
    pub fn with_config(config: PresenceConfig) -> Self {
        Self {
            hub: LocalHub::new(),
            config,
        }
    }

    /// Join a new peer and start its session
    pub fn join(&self, name: &str) -> Result<TestPeer> {
        let user = test_user(name);
        let link = self.hub.join(user.clone());
        let session = ChatSession::start(link.clone(), self.config)?;
        let events = session.events();

        Ok(TestPeer {
            user,
            link,
            session,
            events,
        })
    }

    /// Inject a raw payload as if `source` had sent it
    pub fn inject(&self, source: &User, payload: &str) -> usize {
        self.hub.deliver_raw(source, payload)
    }
}

impl Default for TestHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Let spawned tasks (inbound pumps, timers) run to quiescence
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Advance the paused clock, then let tasks react
pub async fn advance(duration: Duration) {
    tokio::time::advance(duration).await;
    settle().await;
}

/// Broadcast directly through a peer's transport, bypassing its session
pub fn raw_broadcast(peer: &TestPeer, envelope: &chat_core::Envelope) -> Result<()> {
    peer.link.broadcast(envelope)?;
    Ok(())
}
