//! Session Integration Tests
//!
//! Several peers on one in-process hub, driven on a paused clock.
//!
//! Run with: cargo test -p integration-tests --test session_tests

use std::time::Duration;

use chat_core::{Envelope, SessionEvent};
use integration_tests::{advance, settle, speak_payload, typing_payload, TestHub};

const SEND_PERIOD: Duration = Duration::from_millis(1000);
const EXPIRY: Duration = Duration::from_millis(2000);

// ============================================================================
// Typing notifications
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_typing_notifications_are_throttled() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let mut bob = hub.join("bob").unwrap();

    // Keystrokes every 100ms for 3.5s
    let mut sent = 0;
    for _ in 0..35 {
        if alice.session.notify_typing() {
            sent += 1;
        }
        advance(Duration::from_millis(100)).await;
    }

    // Windows open at 0, 1000, 2000, 3000
    assert_eq!(sent, 4);

    let started: Vec<_> = bob
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::TypingStarted(_)))
        .collect();
    assert_eq!(started, vec![SessionEvent::TypingStarted(alice.user.id.clone())]);
    assert!(bob.session.is_typing(&alice.user.id));
}

#[tokio::test(start_paused = true)]
async fn test_typing_gate_reopens_after_period() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();

    assert!(alice.session.notify_typing());
    advance(SEND_PERIOD - Duration::from_millis(1)).await;
    assert!(!alice.session.notify_typing());
    advance(Duration::from_millis(1)).await;
    assert!(alice.session.notify_typing());
}

// ============================================================================
// Typing presence
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_continuous_typing_keeps_presence_with_one_timer() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let mut bob = hub.join("bob").unwrap();

    for _ in 0..8 {
        hub.inject(&alice.user, &typing_payload());
        settle().await;
        assert!(bob.session.is_typing(&alice.user.id));
        assert_eq!(bob.session.tracker().unwrap().live_timers(), 1);
        advance(Duration::from_millis(1900)).await;
    }

    // Eight signals spanning 15s produced a single start and no stop
    let events = bob.drain_events();
    assert_eq!(events, vec![SessionEvent::TypingStarted(alice.user.id.clone())]);
}

#[tokio::test(start_paused = true)]
async fn test_typing_expires_exactly_once_after_quiet_period() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let mut bob = hub.join("bob").unwrap();

    hub.inject(&alice.user, &typing_payload());
    settle().await;

    advance(EXPIRY - Duration::from_millis(1)).await;
    assert!(bob.session.is_typing(&alice.user.id));

    advance(Duration::from_millis(1)).await;
    assert!(!bob.session.is_typing(&alice.user.id));

    advance(EXPIRY * 3).await;
    let stops = bob
        .drain_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::TypingStopped(_)))
        .count();
    assert_eq!(stops, 1);
}

#[tokio::test(start_paused = true)]
async fn test_message_clears_typing_immediately() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let mut bob = hub.join("bob").unwrap();

    alice.session.notify_typing();
    settle().await;
    assert!(bob.session.is_typing(&alice.user.id));

    advance(Duration::from_millis(300)).await;
    alice.session.speak("done typing");
    settle().await;

    assert!(!bob.session.is_typing(&alice.user.id));
    assert_eq!(bob.contents(), vec!["done typing"]);

    let events = bob.drain_events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], SessionEvent::TypingStarted(alice.user.id.clone()));
    assert!(matches!(&events[1], SessionEvent::MessageAppended(m) if m.source == alice.user));
    assert_eq!(events[2], SessionEvent::TypingStopped(alice.user.id.clone()));

    // The cancelled timer never fires
    advance(EXPIRY).await;
    assert!(bob.drain_events().is_empty());
}

// ============================================================================
// Message log
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_local_speak_broadcasts_once_and_appends_once() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let bob = hub.join("bob").unwrap();

    let message = alice.session.speak("hello");
    assert_eq!(message.source, alice.user);

    // Sender sees its own message without waiting for the transport
    assert_eq!(alice.contents(), vec!["hello"]);

    settle().await;
    assert_eq!(bob.contents(), vec!["hello"]);
    assert_eq!(bob.session.messages()[0].source, alice.user);

    // No echo back to the sender
    assert_eq!(alice.session.messages().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interleaved_messages_keep_arrival_order() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let bob = hub.join("bob").unwrap();
    let carol = hub.join("carol").unwrap();

    alice.session.speak("a1");
    settle().await;
    carol.session.speak("c1");
    settle().await;
    bob.session.speak("b1");
    settle().await;
    alice.session.speak("a2");
    carol.session.speak("c2");
    settle().await;

    assert_eq!(alice.contents(), vec!["a1", "c1", "b1", "a2", "c2"]);
    assert_eq!(bob.contents(), vec!["a1", "c1", "b1", "a2", "c2"]);

    // Per-sender order holds even for bursts
    for i in 0..10 {
        alice.session.speak(format!("burst {i}"));
    }
    settle().await;
    let burst: Vec<_> = bob
        .contents()
        .into_iter()
        .filter(|c| c.starts_with("burst"))
        .collect();
    let expected: Vec<_> = (0..10).map(|i| format!("burst {i}")).collect();
    assert_eq!(burst, expected);
}

#[tokio::test(start_paused = true)]
async fn test_snapshots_are_immutable() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();

    alice.session.speak("one");
    let snapshot = alice.session.messages();
    alice.session.speak("two");

    assert_eq!(snapshot.len(), 1);
    assert_eq!(alice.session.messages().len(), 2);
}

// ============================================================================
// Forward compatibility
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_unknown_and_malformed_envelopes_are_ignored() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let mut bob = hub.join("bob").unwrap();

    hub.inject(&alice.user, r#"{"type":"reaction","content":"+1"}"#);
    hub.inject(&alice.user, "{not json");
    hub.inject(&alice.user, r#"{"type":null}"#);
    hub.inject(&alice.user, &speak_payload("still works"));
    settle().await;

    assert_eq!(bob.contents(), vec!["still works"]);
    assert_eq!(bob.drain_events().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_source_comes_from_transport_not_payload() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let bob = hub.join("bob").unwrap();

    hub.inject(
        &alice.user,
        r#"{"type":"speak","content":"hi","source":{"id":"mallory","name":"Mallory"}}"#,
    );
    settle().await;

    assert_eq!(bob.session.messages()[0].source, alice.user);
}

// ============================================================================
// Teardown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_no_state_changes_after_release() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let mut bob = hub.join("bob").unwrap();

    hub.inject(&alice.user, &typing_payload());
    settle().await;
    let tracker = bob.session.tracker().unwrap().clone();
    assert_eq!(tracker.live_timers(), 1);
    bob.drain_events();

    bob.session.release();
    assert_eq!(hub.hub.subscriber_count(), 1);

    // The already scheduled timer would have fired here
    advance(EXPIRY * 2).await;
    assert!(bob.drain_events().is_empty());
    assert_eq!(tracker.live_timers(), 0);

    // Nothing reaches a released session
    alice.session.speak("anyone?");
    settle().await;
    assert!(bob.session.messages().is_empty());
    assert!(bob.drain_events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_rebind_moves_to_new_hub() {
    let first = TestHub::new();
    let second = TestHub::new();
    let alice = first.join("alice").unwrap();
    let mut bob = first.join("bob").unwrap();

    alice.session.speak("on first");
    first.inject(&alice.user, &typing_payload());
    settle().await;
    assert!(bob.session.is_typing(&alice.user.id));

    let carol = second.join("carol").unwrap();
    let link = second.hub.join(bob.user.clone());
    bob.session.rebind(link).unwrap();

    // Old hub no longer has bob; typing state was discarded with it
    assert_eq!(first.hub.subscriber_count(), 1);
    assert!(!bob.session.is_typing(&alice.user.id));

    carol.session.speak("on second");
    alice.session.speak("lost");
    settle().await;

    assert_eq!(bob.contents(), vec!["on first", "on second"]);
}

#[tokio::test(start_paused = true)]
async fn test_closed_hub_still_appends_locally() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();

    hub.hub.close();
    alice.session.speak("talking to myself");

    // The gate still lets the call through; only the broadcast fails
    assert!(alice.session.notify_typing());

    assert_eq!(alice.contents(), vec!["talking to myself"]);
}

#[tokio::test(start_paused = true)]
async fn test_raw_envelope_through_link() {
    let hub = TestHub::new();
    let alice = hub.join("alice").unwrap();
    let mut bob = hub.join("bob").unwrap();

    integration_tests::raw_broadcast(&alice, &Envelope::typing()).unwrap();
    settle().await;

    assert_eq!(
        bob.drain_events(),
        vec![SessionEvent::TypingStarted(alice.user.id.clone())]
    );
}
