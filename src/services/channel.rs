//! Outbound Telegram messaging
//!
//! Thin seam over message delivery so the authentication flows never touch
//! transport types directly. Deletion failures are logged and swallowed: a
//! prompt that could not be removed must never abort an authentication step.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode,
};
use teloxide::Bot;
use tracing::{debug, warn};

use crate::utils::errors::Result;

/// One inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback: String,
}

/// Button layout: rows of buttons
pub type ButtonRows = Vec<Vec<InlineButton>>;

/// Outbound message delivery contract
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Send a message, returning the delivered message id
    async fn send(&self, chat_id: i64, text: &str, markup: Option<ButtonRows>) -> Result<i32>;

    /// Best-effort deletion of previous messages
    async fn delete(&self, chat_id: i64, message_ids: &[i32]);
}

/// teloxide-backed channel
#[derive(Clone)]
pub struct TelegramChannel {
    bot: Bot,
}

impl TelegramChannel {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    async fn send(&self, chat_id: i64, text: &str, markup: Option<ButtonRows>) -> Result<i32> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);

        if let Some(rows) = markup {
            let keyboard = rows.into_iter().map(|row| {
                row.into_iter()
                    .map(|b| InlineKeyboardButton::callback(b.text, b.callback))
                    .collect::<Vec<_>>()
            });
            request = request.reply_markup(InlineKeyboardMarkup::new(keyboard));
        }

        let message = request.await?;
        debug!(chat_id = chat_id, message_id = message.id.0, "Message sent");
        Ok(message.id.0)
    }

    async fn delete(&self, chat_id: i64, message_ids: &[i32]) {
        for message_id in message_ids {
            if let Err(e) = self
                .bot
                .delete_message(ChatId(chat_id), MessageId(*message_id))
                .await
            {
                warn!(chat_id = chat_id, message_id = message_id, error = %e,
                      "Failed to delete message");
            }
        }
    }
}
