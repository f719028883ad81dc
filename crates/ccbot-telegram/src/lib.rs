//! Telegram adapter (teloxide).
//!
//! This crate implements the `ccbot-core` MessagingPort and UpdateSource over
//! the Telegram Bot API.

use std::time::Duration;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InputFile, KeyboardButton, KeyboardMarkup},
};

use tokio::time::sleep;

pub mod router;
pub mod updates;

use ccbot_core::{
    domain::ChatId,
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessagingCapabilities, ReplyMenu},
    },
    Result,
};

/// Build a bot whose HTTP client gives up after `timeout`.
///
/// Long polling and sends use separate clients: the poll client must outlive
/// the server-side wait, sends should fail much sooner.
pub fn build_bot(token: &str, timeout: Duration) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::External(format!("telegram client build failed: {e}")))?;
    Ok(Bot::with_client(token, client))
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

/// Reply keyboard for a core menu.
pub fn to_keyboard(menu: &ReplyMenu) -> KeyboardMarkup {
    let rows: Vec<Vec<KeyboardButton>> = menu
        .rows
        .iter()
        .map(|row| row.iter().map(KeyboardButton::new).collect())
        .collect();
    KeyboardMarkup::new(rows)
        .resize_keyboard(menu.resize)
        .one_time_keyboard(menu.one_time)
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_reply_keyboards: true,
            supports_audio_by_url: true,
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        menu: Option<&ReplyMenu>,
    ) -> Result<()> {
        let markup = menu.map(to_keyboard);
        self.with_retry(|| {
            let req = self
                .bot
                .send_message(Self::tg_chat(chat_id), text.to_string())
                .disable_web_page_preview(false);
            match &markup {
                Some(kb) => req.reply_markup(kb.clone()),
                None => req,
            }
        })
        .await?;
        Ok(())
    }

    async fn send_audio(&self, chat_id: ChatId, url: &str) -> Result<()> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| Error::External(format!("invalid audio url {url:?}: {e}")))?;
        self.with_retry(|| {
            self.bot
                .send_audio(Self::tg_chat(chat_id), InputFile::url(url.clone()))
        })
        .await?;
        Ok(())
    }
}
