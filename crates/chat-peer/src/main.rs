//! Chat peer demo entry point
//!
//! Run with:
//! ```bash
//! cargo run -p chat-peer
//! ```
//!
//! Starts a local session and an "echo" peer on an in-process hub. Every line
//! read from stdin is spoken; the echo peer types for a moment and answers.
//! `/quit` or end of input ends the session.
//!
//! Configuration is loaded from environment variables.

use chat_common::{try_init_tracing_with_config, AppConfig, AppError, AppResult, TracingConfig};
use chat_core::{SessionEvent, User, UserId};
use chat_peer::{ChatSession, LocalHub};
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing::{error, info};

/// Delay between the echo peer starting to type and answering
const ECHO_DELAY: Duration = Duration::from_millis(600);

#[tokio::main]
async fn main() {
    // Run the session
    if let Err(e) = run().await {
        error!(error = %e, code = e.error_code(), "Chat peer failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        app = %config.app.name,
        env = ?config.app.env,
        "Configuration loaded"
    );

    let local = User::new(
        config
            .identity
            .user_id
            .clone()
            .unwrap_or_else(UserId::generate),
        config.identity.display_name.clone(),
    );
    let echo_user = User::with_generated_id("echo");

    let mut names = HashMap::new();
    names.insert(local.id.clone(), local.display_name().to_string());
    names.insert(echo_user.id.clone(), echo_user.display_name().to_string());

    let hub = LocalHub::new();
    let mut session =
        ChatSession::start(hub.join(local), config.presence).map_err(AppError::transport)?;
    let echo =
        ChatSession::start(hub.join(echo_user), config.presence).map_err(AppError::transport)?;

    let printer = tokio::spawn(print_events(session.events(), names));
    let echo_task = tokio::spawn(run_echo(echo));

    println!("Connected as {}. Type a message, /quit to leave.", session.local_user());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(AppError::internal)? {
        let line = line.trim();
        if line == "/quit" {
            break;
        }
        if line.is_empty() {
            continue;
        }

        session.notify_typing();
        session.speak(line);
    }

    session.release();
    echo_task.abort();
    printer.abort();
    hub.close();

    info!(messages = session.messages().len(), "Chat session ended");

    Ok(())
}

/// Print session events until the session goes away
async fn print_events(
    mut events: broadcast::Receiver<SessionEvent>,
    names: HashMap<UserId, String>,
) {
    let name_of = |id: &UserId| names.get(id).cloned().unwrap_or_else(|| id.to_string());

    loop {
        match events.recv().await {
            Ok(SessionEvent::MessageAppended(message)) => {
                println!("[{}] {}", message.source.display_name(), message.content);
            }
            Ok(SessionEvent::TypingStarted(user_id)) => {
                println!("  {} is typing...", name_of(&user_id));
            }
            Ok(SessionEvent::TypingStopped(_)) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "Event printer lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Answer every message from another peer after a short typing pause
async fn run_echo(echo: ChatSession) {
    let mut inbox = echo.events();

    loop {
        let message = match inbox.recv().await {
            Ok(SessionEvent::MessageAppended(message)) => message,
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        };

        if message.is_from(echo.local_user()) {
            continue;
        }

        echo.notify_typing();
        tokio::time::sleep(ECHO_DELAY).await;
        echo.speak(format!("you said: {}", message.preview(200)));
    }
}
