use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    conversation::{ConversationState, ConversationStore},
    domain::{ChatId, InboundMessage, Resolution},
    messaging::{port::MessagingPort, types::ReplyMenu},
    ports::{MediaResolver, UpdateHandler},
    utils::preview,
    Result,
};

pub const LABEL_SEARCH: &str = "🔍 Buscar CC (Archive)";
pub const LABEL_HOW_IT_WORKS: &str = "ℹ️ Cómo funciona";
pub const LABEL_EXIT: &str = "❌ Salir";

pub const MENU_PROMPT: &str = "Elige una opción:";
pub const TEXT_ONLY: &str = "Solo manejo texto por ahora.";
pub const SEARCH_PROMPT: &str =
    "Escribe el nombre de la pista o artista que quieres buscar (solo pistas libres):";
pub const HOW_IT_WORKS: &str = "Busco en archive.org (colección pública/CC) y envio la primera .mp3 directa que encuentre.\n\
Si no hay .mp3 directo, dejo el enlace de búsqueda.";
pub const EXIT_TEXT: &str = "Cerrado. Usa 🔍 Buscar CC (Archive) cuando quieras.";
pub const FOUND_TEXT: &str = "Encontrada. Enviando al chat...";
pub const AUDIO_FAILED_TEXT: &str = "Error enviando el audio. Te dejo el enlace:";
pub const NOT_FOUND_TEXT: &str = "No encontré .mp3 directo. Te dejo la búsqueda:";

pub fn searching_text(query: &str) -> String {
    format!("Buscando pistas libres: {query} 🔎")
}

/// The quick-reply menu: search + how-it-works on the first row, exit below.
pub fn main_menu() -> ReplyMenu {
    ReplyMenu::from_labels(&[&[LABEL_SEARCH, LABEL_HOW_IT_WORKS], &[LABEL_EXIT]])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuAction {
    Search,
    HowItWorks,
    Exit,
}

impl MenuAction {
    fn parse(text: &str) -> Option<Self> {
        match text {
            LABEL_SEARCH => Some(Self::Search),
            LABEL_HOW_IT_WORKS => Some(Self::HowItWorks),
            LABEL_EXIT => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Decides the reply to each inbound message and drives the conversation state.
///
/// Owns the conversation store; the update loop owns the dispatcher, so all
/// state changes happen on one sequential path. Outbound sends are
/// best-effort: failures are logged and never abort handling.
pub struct Dispatcher {
    conversations: ConversationStore,
    messenger: Arc<dyn MessagingPort>,
    resolver: Arc<dyn MediaResolver>,
    menu: ReplyMenu,
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn MessagingPort>, resolver: Arc<dyn MediaResolver>) -> Self {
        Self::with_store(ConversationStore::new(), messenger, resolver)
    }

    pub fn with_store(
        conversations: ConversationStore,
        messenger: Arc<dyn MessagingPort>,
        resolver: Arc<dyn MediaResolver>,
    ) -> Self {
        Self {
            conversations,
            messenger,
            resolver,
            menu: main_menu(),
        }
    }

    pub fn state(&self, chat_id: ChatId) -> ConversationState {
        self.conversations.get(chat_id)
    }

    pub async fn dispatch(&mut self, msg: InboundMessage) {
        let chat_id = msg.chat_id;
        let text = match msg.text.as_deref() {
            Some(t) if !t.is_empty() => t.trim(),
            _ => {
                self.say(chat_id, TEXT_ONLY).await;
                return;
            }
        };

        if let Some(action) = MenuAction::parse(text) {
            match action {
                MenuAction::Search => {
                    self.conversations
                        .set(chat_id, ConversationState::AwaitingSearchQuery);
                    self.say(chat_id, SEARCH_PROMPT).await;
                }
                MenuAction::HowItWorks => self.say(chat_id, HOW_IT_WORKS).await,
                MenuAction::Exit => {
                    self.conversations.clear(chat_id);
                    self.say(chat_id, EXIT_TEXT).await;
                }
            }
            return;
        }

        match self.conversations.get(chat_id) {
            ConversationState::AwaitingSearchQuery if text.is_empty() => {
                // Whitespace only: still waiting for a real query.
                self.say(chat_id, SEARCH_PROMPT).await;
            }
            ConversationState::AwaitingSearchQuery => {
                let query = text.to_string();
                self.search(chat_id, &query).await;
                self.conversations.clear(chat_id);
            }
            ConversationState::Idle => self.show_menu(chat_id).await,
        }
    }

    async fn search(&self, chat_id: ChatId, query: &str) {
        info!(chat_id = chat_id.0, query = %preview(query, 80), "search requested");
        self.say(chat_id, &searching_text(query)).await;

        match self.resolver.resolve(query).await {
            Resolution::Found(candidate) => {
                self.say(chat_id, FOUND_TEXT).await;
                if !self.messenger.capabilities().supports_audio_by_url {
                    self.say(chat_id, candidate.as_str()).await;
                    return;
                }
                if let Err(e) = self.messenger.send_audio(chat_id, candidate.as_str()).await {
                    warn!(chat_id = chat_id.0, url = candidate.as_str(), error = %e, "send_audio failed");
                    self.say(chat_id, AUDIO_FAILED_TEXT).await;
                    self.say(chat_id, candidate.as_str()).await;
                }
            }
            Resolution::NotFound => {
                self.say(chat_id, NOT_FOUND_TEXT).await;
                self.say(chat_id, &self.resolver.search_page_url(query))
                    .await;
            }
        }
    }

    async fn show_menu(&self, chat_id: ChatId) {
        let menu = self
            .messenger
            .capabilities()
            .supports_reply_keyboards
            .then_some(&self.menu);
        if let Err(e) = self.messenger.send_text(chat_id, MENU_PROMPT, menu).await {
            warn!(chat_id = chat_id.0, error = %e, "send menu failed");
        }
    }

    async fn say(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.messenger.send_text(chat_id, text, None).await {
            warn!(chat_id = chat_id.0, error = %e, "send_text failed");
        }
    }
}

#[async_trait]
impl UpdateHandler for Dispatcher {
    async fn handle(&mut self, msg: InboundMessage) -> Result<()> {
        self.dispatch(msg).await;
        Ok(())
    }
}
