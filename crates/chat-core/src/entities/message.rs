//! Message entity - a single spoken line in the session log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::User;

/// Message entity
///
/// Immutable once created. `received_at` is the local arrival time and is only
/// used for display; log order is insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub source: User,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl Message {
    /// Create a new Message stamped with the current time
    pub fn new(source: User, content: impl Into<String>) -> Self {
        Self {
            source,
            content: content.into(),
            received_at: Utc::now(),
        }
    }

    /// Check whether this message was spoken by the given user
    #[inline]
    pub fn is_from(&self, user: &User) -> bool {
        self.source.id == user.id
    }

    /// Get a truncated preview of the message (for notifications)
    pub fn preview(&self, max_len: usize) -> &str {
        if self.content.len() <= max_len {
            &self.content
        } else {
            let mut end = max_len;
            while !self.content.is_char_boundary(end) {
                end -= 1;
            }
            &self.content[..end]
        }
    }
}
