//! Test fixtures and data generators
//!
//! Provides reusable test data for integration tests.

use chat_core::{Envelope, User, UserId};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// A user with a readable, unique id
pub fn test_user(name: &str) -> User {
    let id = UserId::parse(&format!("{name}-{}", unique_suffix()))
        .unwrap_or_else(|_| UserId::generate());
    User::new(id, name)
}

/// Raw JSON of a speak envelope
pub fn speak_payload(content: &str) -> String {
    Envelope::speak(content)
        .encode()
        .unwrap_or_else(|_| format!(r#"{{"type":"speak","content":"{content}"}}"#))
}

/// Raw JSON of a typing envelope
pub fn typing_payload() -> String {
    r#"{"type":"typing","content":""}"#.to_string()
}
