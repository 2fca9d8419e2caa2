//! Peer envelope - the `{type, content}` payload exchanged between peers
//!
//! Wire format is JSON: `{"type":"speak","content":"hello"}`. Unrecognized
//! types decode into [`EnvelopeKind::Unknown`] so newer peers can add kinds
//! without breaking older ones.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::User;
use crate::error::DomainError;

/// Envelope type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnvelopeKind {
    /// A chat line
    Speak,
    /// The sender is typing
    Typing,
    /// Any tag this build does not know about
    Unknown(String),
}

impl EnvelopeKind {
    /// Get the wire representation of the tag
    pub fn as_str(&self) -> &str {
        match self {
            Self::Speak => "speak",
            Self::Typing => "typing",
            Self::Unknown(tag) => tag,
        }
    }

    /// Check if this is a tag this build understands
    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl From<String> for EnvelopeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "speak" => Self::Speak,
            "typing" => Self::Typing,
            _ => Self::Unknown(tag),
        }
    }
}

impl From<EnvelopeKind> for String {
    fn from(kind: EnvelopeKind) -> Self {
        match kind {
            EnvelopeKind::Unknown(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload broadcast to every connected peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(default)]
    pub content: String,
}

impl Envelope {
    /// Create a speak envelope
    pub fn speak(content: impl Into<String>) -> Self {
        Self {
            kind: EnvelopeKind::Speak,
            content: content.into(),
        }
    }

    /// Create a typing envelope (content is conventionally empty)
    pub fn typing() -> Self {
        Self {
            kind: EnvelopeKind::Typing,
            content: String::new(),
        }
    }

    /// Encode to the JSON wire format
    pub fn encode(&self) -> Result<String, DomainError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from the JSON wire format
    pub fn decode(payload: &str) -> Result<Self, DomainError> {
        Ok(serde_json::from_str(payload)?)
    }
}

/// Raw inbound payload paired with the sender the transport authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub source: User,
    pub payload: String,
}

impl InboundFrame {
    /// Create a new frame
    pub fn new(source: User, payload: impl Into<String>) -> Self {
        Self {
            source,
            payload: payload.into(),
        }
    }

    /// Decode the payload into an envelope
    pub fn envelope(&self) -> Result<Envelope, DomainError> {
        Envelope::decode(&self.payload)
    }
}
