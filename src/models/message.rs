//! Normalized inbound chat message
//!
//! Every authentication handler consumes this value instead of raw teloxide
//! types; a webhook payload that cannot be normalized (missing sender, no
//! text) is simply not our message and yields `None`.

use serde::{Deserialize, Serialize};
use teloxide::types::Message;

/// Kind of the chat a message arrived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_private(&self) -> bool {
        matches!(self, ChatKind::Private)
    }
}

/// Normalized inbound Telegram message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub chat_id: i64,
    pub text: String,
    pub message_id: i32,
    /// Previous bot prompt in this chat, if the transport tracked one
    pub previous_message_id: Option<i32>,
    pub chat_kind: ChatKind,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language_code: Option<String>,
}

impl ChatMessage {
    /// Normalize a teloxide message; `None` means "ignore, not ours"
    pub fn from_telegram(msg: &Message) -> Option<Self> {
        let user = msg.from.as_ref()?;
        if user.is_bot {
            return None;
        }
        let text = msg.text()?.trim().to_string();
        if text.is_empty() {
            return None;
        }

        let chat_kind = if msg.chat.is_private() {
            ChatKind::Private
        } else if msg.chat.is_group() {
            ChatKind::Group
        } else if msg.chat.is_supergroup() {
            ChatKind::Supergroup
        } else {
            ChatKind::Channel
        };

        Some(Self {
            chat_id: msg.chat.id.0,
            text,
            message_id: msg.id.0,
            previous_message_id: None,
            chat_kind,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
            language_code: user.language_code.clone(),
        })
    }
}
