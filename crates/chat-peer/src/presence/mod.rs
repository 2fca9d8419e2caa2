//! Typing presence
//!
//! Tracks which peers are currently typing. Each peer has at most one live
//! expiry timer; a new signal replaces it, a message or the quiet period
//! clears it.

mod tracker;

pub use tracker::{PresenceTracker, TypingTimer};
