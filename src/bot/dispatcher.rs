//! Long-poll dispatch loop: one spawned task per inbound message.

use std::time::Duration;

use tracing::{debug, error, info};

use crate::app_state::AppState;
use crate::bot::dto::IncomingMessage;

const POLL_TIMEOUT_SECS: u64 = 30;
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(3);

/// Runs the polling loop until the task is dropped. Transport errors are
/// logged and retried after a short backoff; a handler failure is confined to
/// its own task and never stops the loop.
pub async fn run(state: AppState) {
    let mut offset: i64 = 0;
    info!("Dispatch loop started");

    loop {
        let updates = match state.telegram.get_updates(offset, POLL_TIMEOUT_SECS).await {
            Ok(updates) => updates,
            Err(err) => {
                error!("Polling for updates failed: {:#}", err);
                tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };

            let state = state.clone();
            tokio::spawn(async move {
                handle_message(state, message).await;
            });
        }
    }
}

async fn handle_message(state: AppState, message: IncomingMessage) {
    let Some(text) = message.text.as_deref() else {
        debug!("Ignoring non-text message {}", message.message_id);
        return;
    };

    let reply = if is_start_command(text) {
        greeting(&message)
    } else {
        state.series.handle_message(text).await
    };

    if let Err(err) = state.telegram.send_message(message.chat.id, &reply).await {
        error!("Failed to reply to chat {}: {:#}", message.chat.id, err);
    }
}

/// Matches `/start`, with or without a bot mention or payload.
fn is_start_command(text: &str) -> bool {
    let first = text.trim_start().split_whitespace().next().unwrap_or("");
    first.split('@').next() == Some("/start")
}

fn greeting(message: &IncomingMessage) -> String {
    let name = message
        .from
        .as_ref()
        .map(|user| user.full_name())
        .unwrap_or_else(|| "there".to_string());
    format!("Hello, <b>{}</b>!", escape_html(&name))
}

/// Minimal HTML escaping for Telegram's HTML parse mode.
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
