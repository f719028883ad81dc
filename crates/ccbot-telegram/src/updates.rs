use std::time::Duration;

use async_trait::async_trait;
use teloxide::{prelude::*, types::UpdateKind};
use tracing::debug;

use ccbot_core::{
    domain::{ChatId, InboundMessage, Update, UpdateId},
    errors::Error,
    ports::UpdateSource,
    Result,
};

/// `getUpdates` long polling as an `UpdateSource`.
#[derive(Clone)]
pub struct TelegramUpdates {
    bot: Bot,
}

impl TelegramUpdates {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

/// Map a Telegram update onto the core model. Only plain messages carry a
/// payload; every other kind is kept as an id so the cursor still moves past it.
pub fn to_core_update(update: teloxide::types::Update) -> Update {
    let id = UpdateId(i64::from(update.id));
    let message = match update.kind {
        UpdateKind::Message(msg) => Some(InboundMessage {
            chat_id: ChatId(msg.chat.id.0),
            text: msg.text().map(str::to_string),
        }),
        other => {
            debug!(update_id = id.0, kind = ?other, "ignoring non-message update");
            None
        }
    };
    Update { id, message }
}

#[async_trait]
impl UpdateSource for TelegramUpdates {
    async fn fetch_updates(&self, offset: Option<UpdateId>, wait: Duration) -> Result<Vec<Update>> {
        let wait_secs = u32::try_from(wait.as_secs()).unwrap_or(u32::MAX);
        let mut req = self.bot.get_updates().timeout(wait_secs);
        if let Some(offset) = offset {
            let offset = i32::try_from(offset.0)
                .map_err(|_| Error::External(format!("update offset {} out of range", offset.0)))?;
            req = req.offset(offset);
        }

        let updates = req
            .await
            .map_err(|e| Error::External(format!("getUpdates failed: {e}")))?;
        Ok(updates.into_iter().map(to_core_update).collect())
    }
}
