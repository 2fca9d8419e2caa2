//! Session events - state changes published to the presentation layer

use serde::{Deserialize, Serialize};

use crate::entities::{Message, UserId};

/// Observable change in a chat session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionEvent {
    /// A message was appended to the log (local or remote)
    MessageAppended(Message),
    /// A peer went from idle to typing
    TypingStarted(UserId),
    /// A peer went from typing to idle (expiry or message)
    TypingStopped(UserId),
}

impl SessionEvent {
    /// Get the event name
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::MessageAppended(_) => "MESSAGE_APPENDED",
            Self::TypingStarted(_) => "TYPING_STARTED",
            Self::TypingStopped(_) => "TYPING_STOPPED",
        }
    }

    /// Check if this is a presence change
    pub fn is_presence(&self) -> bool {
        matches!(self, Self::TypingStarted(_) | Self::TypingStopped(_))
    }
}
