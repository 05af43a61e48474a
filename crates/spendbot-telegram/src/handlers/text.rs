use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, error};

use spendbot_core::{domain::ChatId, messaging::types::TextMessage};

use crate::router::AppState;

pub async fn handle_text(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let incoming = TextMessage {
        chat_id: ChatId(msg.chat.id.0),
        username: msg.from().and_then(|u| u.username.clone()),
        text: strip_command_prefix(text),
    };
    debug!(
        chat_id = incoming.chat_id.0,
        username = incoming.username.as_deref().unwrap_or("unknown"),
        "incoming text"
    );

    // One clock read per message; everything downstream uses this value.
    let now = chrono::Local::now().naive_local();

    if let Err(e) = state
        .dispatcher
        .respond(state.messenger.as_ref(), incoming.chat_id, &incoming.text, now)
        .await
    {
        error!(chat_id = incoming.chat_id.0, error = %e, "failed to send reply");
    }
    Ok(())
}

/// Telegram clients send commands as `/cmd@botname args`. Drop the slash and bot
/// mention so `/help` classifies like `help`; `/start` is shown the help text.
fn strip_command_prefix(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return trimmed.to_string();
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let cmd = parts
        .next()
        .unwrap_or("")
        .split('@')
        .next()
        .unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    let cmd = if cmd.eq_ignore_ascii_case("start") {
        "help"
    } else {
        cmd
    };

    if args.is_empty() {
        cmd.to_string()
    } else {
        format!("{cmd} {args}")
    }
}
