//! Telegram update handlers.
//!
//! Each handler is a small adapter that checks authorization, captures `now`, and hands
//! the text to the core dispatcher.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::{info, warn};

use spendbot_core::domain::UserId;
use spendbot_core::security::is_authorized;

use crate::router::AppState;

mod text;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));

    if !is_authorized(user_id, &state.cfg.telegram_allowed_users) {
        info!(user_id = ?user_id.map(|u| u.0), "rejected unauthorized user");
        let _ = bot
            .send_message(
                msg.chat.id,
                "Unauthorized. Contact the bot owner for access.",
            )
            .await;
        return Ok(());
    }

    if msg.text().is_some() {
        return text::handle_text(msg, state).await;
    }

    if let Err(e) = bot
        .send_message(
            msg.chat.id,
            "Send me a text message, e.g. \"spent 100 on tea\" or \"help\".",
        )
        .await
    {
        warn!(error = %e, "failed to answer non-text message");
    }
    Ok(())
}
