use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use ccbot_core::{
    config::Config,
    dispatcher::Dispatcher,
    messaging::port::MessagingPort,
    polling::UpdateLoop,
    ports::{MediaResolver, UpdateSource},
};

use crate::{build_bot, updates::TelegramUpdates, TelegramMessenger};

/// Wire Telegram to the core dispatcher and poll until the process dies.
pub async fn run_polling(cfg: Arc<Config>, resolver: Arc<dyn MediaResolver>) -> anyhow::Result<()> {
    let send_bot = build_bot(&cfg.telegram_bot_token, cfg.send_timeout)?;
    let poll_bot = build_bot(&cfg.telegram_bot_token, cfg.poll.request_timeout())?;

    // Basic startup info; a failure here is not fatal, polling will keep retrying.
    match send_bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "ccbot started"),
        Err(e) => warn!(error = %e, "getMe failed; is TOKEN valid?"),
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(send_bot));
    let source: Arc<dyn UpdateSource> = Arc::new(TelegramUpdates::new(poll_bot));
    let dispatcher = Dispatcher::new(messenger, resolver);

    UpdateLoop::new(source, dispatcher, cfg.poll.clone())
        .run()
        .await;

    Ok(())
}
