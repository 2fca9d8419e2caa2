//! # chat-core
//!
//! Domain layer for peer-to-peer chat: user identities, the message record,
//! the `{type, content}` envelope exchanged between peers, and the events a
//! session publishes to its presentation layer.
//! This crate has zero dependencies on the async runtime or any transport.

pub mod entities;
pub mod error;
pub mod events;

// Re-export commonly used types at crate root
pub use entities::{Message, User, UserId};
pub use error::DomainError;
pub use events::{Envelope, EnvelopeKind, InboundFrame, SessionEvent};
