//! Per-chat login session persistence
//!
//! Sessions are JSON-serialized [`LoginStep`] values in the code store under
//! `login:{chat_id}` with a sliding TTL. Expiry is the only way out of the
//! `Error` step, so the TTL doubles as the retry window.
//!
//! A chat-scoped async lock serializes load/advance/save so two messages
//! from the same chat never interleave; different chats proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::services::code_store::CodeStore;
use crate::state::machine::LoginStep;
use crate::utils::errors::Result;

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn CodeStore>,
    ttl: Duration,
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn CodeStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(store: Arc<dyn CodeStore>, config: &AuthConfig) -> Self {
        Self::new(store, Duration::from_secs(config.login_session_ttl_seconds))
    }

    fn key(chat_id: i64) -> String {
        format!("login:{}", chat_id)
    }

    /// Acquire the per-chat lock; hold the guard across load/advance/save
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Load the cached step; a missing or unreadable entry restarts at `Start`
    pub async fn load(&self, chat_id: i64) -> Result<Option<LoginStep>> {
        match self.store.get(&Self::key(chat_id)).await? {
            None => Ok(None),
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(step) => Ok(Some(step)),
                Err(e) => {
                    warn!(chat_id = chat_id, error = %e, "Discarding unreadable login session");
                    self.store.delete(&Self::key(chat_id)).await?;
                    Ok(None)
                }
            },
        }
    }

    /// Persist the step and refresh the TTL
    pub async fn save(&self, chat_id: i64, step: &LoginStep) -> Result<()> {
        let raw = serde_json::to_string(step)?;
        self.store.set(&Self::key(chat_id), &raw, self.ttl).await?;
        debug!(chat_id = chat_id, step = ?step, "Saved login session");
        Ok(())
    }

    pub async fn clear(&self, chat_id: i64) -> Result<()> {
        self.store.delete(&Self::key(chat_id)).await?;
        debug!(chat_id = chat_id, "Cleared login session");
        Ok(())
    }

    /// Whether this chat is mid-conversation
    pub async fn exists(&self, chat_id: i64) -> Result<bool> {
        Ok(self.store.get(&Self::key(chat_id)).await?.is_some())
    }
}
