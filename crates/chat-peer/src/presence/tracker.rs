//! Typing presence tracker
//!
//! Per-peer state machine with states `idle` (no entry) and `typing` (entry
//! holding a live [`TypingTimer`]). Uses `DashMap` so every transition for one
//! peer happens under that peer's entry lock.

use chat_core::{SessionEvent, User, UserId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// The single live expiry timer for a typing peer
#[derive(Debug)]
pub struct TypingTimer {
    timer_id: u64,
    expires_at: Instant,
    handle: JoinHandle<()>,
}

impl TypingTimer {
    /// Get the timer id (unique per tracker, increasing)
    pub fn timer_id(&self) -> u64 {
        self.timer_id
    }

    /// Get the instant at which the peer reverts to idle
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    fn cancel(&self) {
        self.handle.abort();
    }
}

/// Tracks typing presence for every remote peer of one hub attachment
pub struct PresenceTracker {
    /// Quiet period before a typing peer reverts to idle
    expiry: Duration,
    /// Live timers by peer id; absence means idle
    timers: DashMap<UserId, TypingTimer>,
    /// Source of timer ids
    next_timer_id: AtomicU64,
    /// Set by teardown; no state changes afterwards
    closed: AtomicBool,
    /// Outbound presence events
    events: broadcast::Sender<SessionEvent>,
    /// Handle to ourselves for timer tasks
    this: Weak<Self>,
}

impl PresenceTracker {
    /// Create a tracker with an empty typing map
    pub fn new(expiry: Duration, events: broadcast::Sender<SessionEvent>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            expiry,
            timers: DashMap::new(),
            next_timer_id: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            events,
            this: this.clone(),
        })
    }

    /// Handle an inbound typing signal from `user`
    ///
    /// `idle -> typing` arms a timer and publishes `TypingStarted`.
    /// `typing -> typing` cancels the current timer before arming a new one.
    /// Must be called from within a Tokio runtime.
    pub fn on_typing_signal(&self, user: &User) {
        if self.is_closed() {
            return;
        }

        match self.timers.entry(user.id.clone()) {
            Entry::Occupied(mut entry) => {
                entry.get().cancel();
                let timer = self.arm(&user.id);
                tracing::trace!(
                    user_id = %user.id,
                    timer_id = timer.timer_id,
                    "Typing timer re-armed"
                );
                entry.insert(timer);
            }
            Entry::Vacant(entry) => {
                let timer = self.arm(&user.id);
                tracing::debug!(
                    user_id = %user.id,
                    timer_id = timer.timer_id,
                    "Peer started typing"
                );
                entry.insert(timer);
                self.publish(SessionEvent::TypingStarted(user.id.clone()));
            }
        }

        // Lost a race with teardown on another worker
        if self.is_closed() {
            if let Some((_, timer)) = self.timers.remove(&user.id) {
                timer.cancel();
            }
        }
    }

    /// Handle a message from `user`, which ends any typing state immediately
    pub fn on_speak(&self, user: &User) {
        if self.is_closed() {
            return;
        }

        if let Some((user_id, timer)) = self.timers.remove(&user.id) {
            timer.cancel();
            tracing::debug!(user_id = %user_id, "Peer stopped typing (message)");
            self.publish(SessionEvent::TypingStopped(user_id));
        }
    }

    /// Cancel every pending timer and discard all state
    ///
    /// Idempotent. After this returns no timer can change state or publish.
    pub fn teardown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let user_ids: Vec<UserId> = self.timers.iter().map(|e| e.key().clone()).collect();
        let mut cancelled = 0usize;
        for user_id in user_ids {
            if let Some((_, timer)) = self.timers.remove(&user_id) {
                timer.cancel();
                cancelled += 1;
            }
        }

        tracing::debug!(cancelled, "Presence tracker torn down");
    }

    /// Check if the tracker has been torn down
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Check whether `user_id` is currently typing
    pub fn is_typing(&self, user_id: &UserId) -> bool {
        self.timers.contains_key(user_id)
    }

    /// Get the set of peers currently typing
    pub fn typing_users(&self) -> HashSet<UserId> {
        self.timers.iter().map(|e| e.key().clone()).collect()
    }

    /// Get when `user_id`'s typing indicator will expire, if typing
    pub fn expires_at(&self, user_id: &UserId) -> Option<Instant> {
        self.timers.get(user_id).map(|t| t.expires_at)
    }

    /// Get the current timer id for `user_id`, if typing
    pub fn timer_id(&self, user_id: &UserId) -> Option<u64> {
        self.timers.get(user_id).map(|t| t.timer_id)
    }

    /// Get the number of armed timers (equals the number of typing peers)
    pub fn live_timers(&self) -> usize {
        self.timers.len()
    }

    /// Get the configured quiet period
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Spawn the expiry task for a fresh timer
    fn arm(&self, user_id: &UserId) -> TypingTimer {
        let timer_id = self.next_timer_id.fetch_add(1, Ordering::SeqCst) + 1;
        let expires_at = Instant::now() + self.expiry;
        let tracker = self.this.clone();
        let user_id = user_id.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            if let Some(tracker) = tracker.upgrade() {
                tracker.expire(&user_id, timer_id);
            }
        });

        TypingTimer {
            timer_id,
            expires_at,
            handle,
        }
    }

    /// Quiet period elapsed for `timer_id`
    ///
    /// Only removes the entry if it still belongs to this timer, so a timer
    /// that fired while being replaced is a no-op.
    fn expire(&self, user_id: &UserId, timer_id: u64) {
        if self.is_closed() {
            return;
        }

        let removed = self
            .timers
            .remove_if(user_id, |_, timer| timer.timer_id == timer_id);

        match removed {
            Some((user_id, _)) => {
                tracing::debug!(user_id = %user_id, timer_id, "Peer stopped typing (expired)");
                self.publish(SessionEvent::TypingStopped(user_id));
            }
            None => {
                tracing::trace!(user_id = %user_id, timer_id, "Stale typing timer ignored");
            }
        }
    }

    fn publish(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }
}

impl Drop for PresenceTracker {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            entry.cancel();
        }
    }
}

impl fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("expiry", &self.expiry)
            .field("typing", &self.timers.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}
