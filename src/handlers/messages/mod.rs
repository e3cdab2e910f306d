//! Registration and handshake message handling
//!
//! First point of contact for private-chat messages that are not part of a
//! login conversation. Handles, in priority order: handshake token redemption,
//! first contact, and the email/password collection for chats whose binding
//! is still `New`. Messages carrying credentials are deleted from the chat
//! together with the prompt that solicited them.
//!
//! An email that matches no account still advances to the password prompt so
//! the flow never reveals whether an address is registered; the password step
//! then fails uniformly.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::repositories::ChatBindingStore;
use crate::models::binding::{ChatBinding, ChatBindingStatus, NewChatBinding};
use crate::models::message::ChatMessage;
use crate::services::account::AccountLookup;
use crate::services::channel::MessageChannel;
use crate::services::code_store::CodeStore;
use crate::services::handshake::HandshakeCoordinator;
use crate::state::machine::{is_email, MSG_AUTH_ERROR};
use crate::utils::errors::Result;

pub const MSG_REG_ENTER_EMAIL: &str = "Enter your email to link this chat to your account";
pub const MSG_REG_ENTER_PASSWORD: &str = "Enter your password";
pub const MSG_REG_SUCCESS: &str = "Your Telegram account is now linked. You can sign in with it.";
pub const MSG_HANDSHAKE_DENIED: &str = "This chat is not authorized to confirm sign-ins";

/// Bookkeeping TTL for the last prompt message id per chat
const PROMPT_TRACK_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone)]
pub struct RegistrationFlow {
    bindings: Arc<dyn ChatBindingStore>,
    accounts: Arc<dyn AccountLookup>,
    handshake: HandshakeCoordinator,
    channel: Arc<dyn MessageChannel>,
    store: Arc<dyn CodeStore>,
}

impl RegistrationFlow {
    pub fn new(
        bindings: Arc<dyn ChatBindingStore>,
        accounts: Arc<dyn AccountLookup>,
        handshake: HandshakeCoordinator,
        channel: Arc<dyn MessageChannel>,
        store: Arc<dyn CodeStore>,
    ) -> Self {
        Self {
            bindings,
            accounts,
            handshake,
            channel,
            store,
        }
    }

    /// Process one inbound message
    pub async fn handle(&self, message: &ChatMessage) -> Result<()> {
        if !message.chat_kind.is_private() {
            return Ok(());
        }

        let binding = self.bindings.find_by_chat(message.chat_id).await?;

        if let Some(token) = extract_handshake_token(&message.text) {
            return self.handle_handshake(message, binding.as_ref(), token).await;
        }

        match binding {
            None => self.handle_first_contact(message).await,
            Some(binding) if binding.status == ChatBindingStatus::New => {
                self.handle_credentials(message, &binding).await
            }
            // Active and Blocked chats get nothing from this flow
            Some(_) => Ok(()),
        }
    }

    /// Deliver a short verification code for a browser-side handshake token
    async fn handle_handshake(
        &self,
        message: &ChatMessage,
        binding: Option<&ChatBinding>,
        token: Uuid,
    ) -> Result<()> {
        let code = match self.handshake.verify(&token).await? {
            Some(code) => code,
            None => {
                warn!(chat_id = message.chat_id, token = %token, "Unknown or expired handshake token");
                return Ok(());
            }
        };

        // Any bound chat that is not blocked may confirm a sign-in; a chat
        // mid-registration gets its code in the same exchange.
        let authorized = match binding {
            Some(binding) if binding.is_blocked() => {
                self.delete_tracked(message).await;
                false
            }
            Some(_) => true,
            None => false,
        };

        if !authorized {
            self.send_tracked(message.chat_id, MSG_HANDSHAKE_DENIED).await?;
            return Ok(());
        }

        self.delete_tracked(message).await;

        let text = format!(
            "Do not share this code with anyone.\n\
             Verification code: <b>{}</b>\n\
             We will never ask you for it. Only scammers do.",
            code
        );
        self.channel.send(message.chat_id, &text, None).await?;
        self.handshake.redeem(&token).await?;
        info!(chat_id = message.chat_id, token = %token, "Handshake code delivered");
        Ok(())
    }

    /// First message from an unknown chat opens a `New` binding
    async fn handle_first_contact(&self, message: &ChatMessage) -> Result<()> {
        let binding = NewChatBinding {
            chat_id: message.chat_id,
            account_id: None,
            status: ChatBindingStatus::New,
            username: message.username.clone(),
            first_name: message.first_name.clone(),
        };
        self.bindings.save(binding).await?;
        info!(chat_id = message.chat_id, "New chat binding opened");

        self.send_tracked(message.chat_id, MSG_REG_ENTER_EMAIL).await?;
        Ok(())
    }

    /// Email and password collection for a `New` binding
    async fn handle_credentials(&self, message: &ChatMessage, binding: &ChatBinding) -> Result<()> {
        // Credential material never stays visible in the chat
        self.delete_tracked(message).await;

        if is_email(&message.text) {
            return self.handle_email(message, binding).await;
        }

        if let Some(account_id) = binding.account_id {
            return self.handle_password(message, binding, account_id).await;
        }

        if self.awaiting_password(message.chat_id).await? {
            // No real account behind the prompt; fail like a bad password
            self.channel.send(message.chat_id, MSG_AUTH_ERROR, None).await?;
            self.reset_binding(message).await
        } else {
            self.send_tracked(message.chat_id, MSG_REG_ENTER_EMAIL).await?;
            Ok(())
        }
    }

    async fn handle_email(&self, message: &ChatMessage, binding: &ChatBinding) -> Result<()> {
        let snapshot = match self.accounts.find_active_by_email(&message.text).await? {
            Some(account) => NewChatBinding::from_snapshot(binding).with_account(account.id),
            None => {
                debug!(chat_id = message.chat_id, "Email matches no active account");
                // Drop any account pending from an earlier email
                let mut snapshot = NewChatBinding::from_snapshot(binding);
                snapshot.account_id = None;
                snapshot
            }
        };
        // Replaying the same email changes nothing; append only on change
        if snapshot.account_id != binding.account_id {
            self.bindings.save(snapshot).await?;
        }

        // Prompt for a password either way; an unknown email is not revealed
        self.mark_awaiting_password(message.chat_id).await?;
        self.send_tracked(message.chat_id, MSG_REG_ENTER_PASSWORD).await?;
        Ok(())
    }

    async fn handle_password(
        &self,
        message: &ChatMessage,
        binding: &ChatBinding,
        account_id: Uuid,
    ) -> Result<()> {
        self.store
            .delete(&format!("reg:pw:{}", message.chat_id))
            .await?;

        let account = match self.accounts.find_by_id(account_id).await? {
            Some(account) => account,
            None => {
                warn!(chat_id = message.chat_id, account_id = %account_id,
                    "Account disappeared during registration");
                self.bindings.remove(account_id).await?;
                return Ok(());
            }
        };

        if self.accounts.verify_password(&account, &message.text).await? {
            let snapshot =
                NewChatBinding::from_snapshot(binding).with_status(ChatBindingStatus::Active);
            self.bindings.save(snapshot).await?;
            info!(chat_id = message.chat_id, account_id = %account_id, "Chat binding activated");
            self.channel.send(message.chat_id, MSG_REG_SUCCESS, None).await?;
        } else {
            info!(chat_id = message.chat_id, account_id = %account_id,
                "Wrong password, dropping chat binding");
            self.bindings.remove(account_id).await?;
            self.channel.send(message.chat_id, MSG_AUTH_ERROR, None).await?;
        }
        Ok(())
    }

    /// A failed attempt with no backing account starts the chat over
    async fn reset_binding(&self, message: &ChatMessage) -> Result<()> {
        let binding = NewChatBinding {
            chat_id: message.chat_id,
            account_id: None,
            status: ChatBindingStatus::New,
            username: message.username.clone(),
            first_name: message.first_name.clone(),
        };
        self.bindings.save(binding).await?;
        self.store
            .delete(&format!("reg:pw:{}", message.chat_id))
            .await?;
        Ok(())
    }

    async fn mark_awaiting_password(&self, chat_id: i64) -> Result<()> {
        self.store
            .set(&format!("reg:pw:{}", chat_id), "1", PROMPT_TRACK_TTL)
            .await
    }

    async fn awaiting_password(&self, chat_id: i64) -> Result<bool> {
        Ok(self.store.get(&format!("reg:pw:{}", chat_id)).await?.is_some())
    }

    /// Send a prompt and remember its message id for later deletion
    async fn send_tracked(&self, chat_id: i64, text: &str) -> Result<()> {
        let message_id = self.channel.send(chat_id, text, None).await?;
        self.store
            .set(
                &format!("msg:last:{}", chat_id),
                &message_id.to_string(),
                PROMPT_TRACK_TTL,
            )
            .await?;
        Ok(())
    }

    /// Delete the inbound message and the prompt that solicited it
    async fn delete_tracked(&self, message: &ChatMessage) {
        let mut ids = vec![message.message_id];
        if let Some(prev) = message.previous_message_id {
            ids.push(prev);
        }

        let key = format!("msg:last:{}", message.chat_id);
        if let Ok(Some(raw)) = self.store.get(&key).await {
            if let Ok(id) = raw.parse::<i32>() {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            let _ = self.store.delete(&key).await;
        }

        self.channel.delete(message.chat_id, &ids).await;
    }
}

/// `/start <uuid>` deep links and bare UUID pastes both carry a token
fn extract_handshake_token(text: &str) -> Option<Uuid> {
    let candidate = text
        .strip_prefix("/start ")
        .map(str::trim)
        .unwrap_or_else(|| text.trim());
    Uuid::parse_str(candidate).ok()
}
