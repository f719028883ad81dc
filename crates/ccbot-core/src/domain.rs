/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram update sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UpdateId(pub i64);

impl UpdateId {
    /// Offset that acknowledges this update and everything before it.
    pub fn next(self) -> UpdateId {
        UpdateId(self.0.saturating_add(1))
    }
}

/// One inbound message, consumed once by the dispatcher.
///
/// `text` is `None` for stickers, photos, voice notes and other non-text
/// messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub text: Option<String>,
}

/// One update as delivered by the update source.
///
/// `message` is `None` for update kinds we do not handle (edited messages,
/// callbacks, payloads the adapter could not parse).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Update {
    pub id: UpdateId,
    pub message: Option<InboundMessage>,
}

/// A fully-qualified URL believed to point at a directly fetchable audio file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaCandidate(pub String);

impl MediaCandidate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of resolving a free-text query against the archive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Found(MediaCandidate),
    NotFound,
}
