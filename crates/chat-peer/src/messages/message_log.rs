//! Append-only message log
//!
//! Readers get an `Arc` snapshot; appends copy-on-write, so a snapshot never
//! changes after it has been handed out.

use chat_core::{Message, User};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Ordered record of every message spoken in a session
#[derive(Default)]
pub struct MessageLog {
    entries: RwLock<Arc<Vec<Message>>>,
}

impl MessageLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message; insertion order is display order
    pub fn append(&self, source: User, content: impl Into<String>) -> Message {
        let message = Message::new(source, content);
        {
            let mut entries = self.entries.write();
            Arc::make_mut(&mut entries).push(message.clone());
        }

        tracing::trace!(
            source = %message.source.id,
            len = message.content.len(),
            "Message appended"
        );

        message
    }

    /// Get an immutable view of the log as of now
    pub fn snapshot(&self) -> Arc<Vec<Message>> {
        self.entries.read().clone()
    }

    /// Get the most recent message
    pub fn last(&self) -> Option<Message> {
        self.entries.read().last().cloned()
    }

    /// Get the number of messages
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if nothing has been said yet
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for MessageLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageLog")
            .field("len", &self.len())
            .finish()
    }
}
