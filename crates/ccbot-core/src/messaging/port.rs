use async_trait::async_trait;

use crate::{
    domain::ChatId,
    messaging::types::{MessagingCapabilities, ReplyMenu},
    Result,
};

/// Outbound messaging port.
///
/// Every call may fail; callers decide whether a failure is worth a fallback
/// message or just a log line.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat_id: ChatId, text: &str, menu: Option<&ReplyMenu>)
        -> Result<()>;

    /// Ask the platform to fetch `url` itself and deliver it as an audio message.
    async fn send_audio(&self, chat_id: ChatId, url: &str) -> Result<()>;
}
