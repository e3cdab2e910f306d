//! Login orchestration
//!
//! Drives one inbound chat message through the login state machine under the
//! chat lock, persists the resulting step, and on success replaces the
//! session with an active chat binding.

use std::sync::Arc;

use tracing::{info, warn};

use crate::database::repositories::ChatBindingStore;
use crate::models::binding::{ChatBindingStatus, NewChatBinding};
use crate::models::message::ChatMessage;
use crate::services::channel::MessageChannel;
use crate::state::machine::{LoginStep, LoginStepMachine};
use crate::state::session::SessionStore;
use crate::utils::errors::Result;
use crate::utils::logging::log_auth_event;

#[derive(Clone)]
pub struct LoginService {
    sessions: SessionStore,
    machine: LoginStepMachine,
    bindings: Arc<dyn ChatBindingStore>,
    channel: Arc<dyn MessageChannel>,
}

impl LoginService {
    pub fn new(
        sessions: SessionStore,
        machine: LoginStepMachine,
        bindings: Arc<dyn ChatBindingStore>,
        channel: Arc<dyn MessageChannel>,
    ) -> Self {
        Self {
            sessions,
            machine,
            bindings,
            channel,
        }
    }

    /// Whether this chat has a login conversation in flight
    pub async fn has_session(&self, chat_id: i64) -> Result<bool> {
        self.sessions.exists(chat_id).await
    }

    /// Process one inbound message for this chat's login conversation
    pub async fn handle_input(&self, message: &ChatMessage) -> Result<()> {
        let chat_id = message.chat_id;
        let _guard = self.sessions.lock_chat(chat_id).await;

        let current = self
            .sessions
            .load(chat_id)
            .await?
            .unwrap_or(LoginStep::Start);

        let outcome = self.machine.advance(current, &message.text).await?;

        match &outcome.step {
            LoginStep::Success { account_id } => {
                let binding = NewChatBinding {
                    chat_id,
                    account_id: Some(*account_id),
                    status: ChatBindingStatus::Active,
                    username: message.username.clone(),
                    first_name: message.first_name.clone(),
                };
                self.bindings.save(binding).await?;
                self.sessions.clear(chat_id).await?;
                info!(chat_id = chat_id, account_id = %account_id, "Login completed");
                log_auth_event(chat_id, "login", true, None);
            }
            LoginStep::Error => {
                self.sessions.save(chat_id, &LoginStep::Error).await?;
                log_auth_event(chat_id, "login", false, None);
            }
            step => {
                self.sessions.save(chat_id, step).await?;
            }
        }

        if let Some(text) = &outcome.message {
            if let Err(e) = self.channel.send(chat_id, text, outcome.markup).await {
                warn!(chat_id = chat_id, error = %e, "Failed to send login prompt");
            }
        }

        Ok(())
    }
}
