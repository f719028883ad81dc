use std::collections::HashMap;

use crate::domain::ChatId;

/// What the bot expects next from a chat.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingSearchQuery,
}

/// In-memory per-chat conversation state.
///
/// A missing entry means `Idle`; storing `Idle` removes the entry so the map
/// only ever holds chats with something pending. Not synchronized: the store
/// is owned by the dispatcher and touched from one sequential path.
#[derive(Debug, Default)]
pub struct ConversationStore {
    states: HashMap<ChatId, ConversationState>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: ChatId) -> ConversationState {
        self.states.get(&chat_id).copied().unwrap_or_default()
    }

    pub fn set(&mut self, chat_id: ChatId, state: ConversationState) {
        match state {
            ConversationState::Idle => self.clear(chat_id),
            other => {
                self.states.insert(chat_id, other);
            }
        }
    }

    pub fn clear(&mut self, chat_id: ChatId) {
        self.states.remove(&chat_id);
    }

    /// Number of chats with a pending state.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
