use std::sync::Arc;

use teloxide::{dispatching::Dispatcher as TgDispatcher, dptree, prelude::*};
use tracing::{info, warn};

use spendbot_core::{config::Config, dispatcher::Dispatcher, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Long-poll Telegram until the process is stopped.
pub async fn run_polling(cfg: Arc<Config>, dispatcher: Arc<Dispatcher>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "spendbot started"),
        Err(e) => warn!(error = %e, "could not fetch bot identity"),
    }
    if cfg.telegram_allowed_users.is_empty() {
        info!("no allow-list configured; accepting messages from everyone");
    } else {
        info!(allowed = cfg.telegram_allowed_users.len(), "allow-list active");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));

    let state = Arc::new(AppState {
        cfg,
        dispatcher,
        messenger,
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    TgDispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
