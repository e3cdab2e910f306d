//! Test helpers module
//!
//! In-memory doubles for the persistence and transport seams so the
//! authentication flows run without Postgres, Redis, or the Telegram API.

use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use TeleAuth::database::repositories::ChatBindingStore;
use TeleAuth::models::binding::{ChatBinding, NewChatBinding};
use TeleAuth::models::message::{ChatKind, ChatMessage};
use TeleAuth::services::account::{AccountLookup, AccountRef};
use TeleAuth::services::channel::{ButtonRows, MessageChannel};
use TeleAuth::utils::errors::Result;

/// Append-only binding store over a Vec, mirroring the SQL repository's
/// latest-snapshot-wins reads
#[derive(Default)]
pub struct MemoryBindingStore {
    rows: Mutex<Vec<ChatBinding>>,
    next_event_id: AtomicI64,
}

impl MemoryBindingStore {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_event_id: AtomicI64::new(1),
        }
    }

    /// Full snapshot history for assertions
    pub async fn history(&self, chat_id: i64) -> Vec<ChatBinding> {
        self.rows
            .lock()
            .await
            .iter()
            .filter(|b| b.chat_id == chat_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ChatBindingStore for MemoryBindingStore {
    async fn find_by_chat(&self, chat_id: i64) -> Result<Option<ChatBinding>> {
        let rows = self.rows.lock().await;
        Ok(rows
            .iter()
            .filter(|b| b.chat_id == chat_id)
            .max_by_key(|b| b.event_id)
            .cloned())
    }

    async fn find_by_account(&self, account_id: Uuid) -> Result<Vec<ChatBinding>> {
        let rows = self.rows.lock().await;
        let mut current: Vec<ChatBinding> = Vec::new();
        for chat_id in rows.iter().map(|b| b.chat_id) {
            if current.iter().any(|b| b.chat_id == chat_id) {
                continue;
            }
            let latest = rows
                .iter()
                .filter(|b| b.chat_id == chat_id)
                .max_by_key(|b| b.event_id);
            if let Some(latest) = latest {
                if latest.account_id == Some(account_id) {
                    current.push(latest.clone());
                }
            }
        }
        Ok(current)
    }

    async fn find_active_by_chat(&self, chat_id: i64) -> Result<Option<ChatBinding>> {
        Ok(self.find_by_chat(chat_id).await?.filter(ChatBinding::is_active))
    }

    async fn save(&self, binding: NewChatBinding) -> Result<ChatBinding> {
        let snapshot = ChatBinding {
            chat_id: binding.chat_id,
            account_id: binding.account_id,
            status: binding.status,
            username: binding.username,
            first_name: binding.first_name,
            event_id: self.next_event_id.fetch_add(1, Ordering::SeqCst),
            created_at: Utc::now(),
        };
        self.rows.lock().await.push(snapshot.clone());
        Ok(snapshot)
    }

    async fn remove(&self, account_id: Uuid) -> Result<()> {
        let mut rows = self.rows.lock().await;
        let chats: Vec<i64> = rows
            .iter()
            .filter(|b| b.account_id == Some(account_id))
            .map(|b| b.chat_id)
            .collect();
        rows.retain(|b| !chats.contains(&b.chat_id));
        Ok(())
    }
}

/// Account lookup with one fixed account and plaintext password comparison
pub struct StubAccounts {
    pub account: AccountRef,
    pub password: String,
}

impl StubAccounts {
    pub fn single(email: &str, password: &str) -> (Arc<Self>, Uuid) {
        let id = Uuid::new_v4();
        let stub = Arc::new(Self {
            account: AccountRef::new(id, email, "test-hash"),
            password: password.to_string(),
        });
        (stub, id)
    }
}

#[async_trait]
impl AccountLookup for StubAccounts {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<AccountRef>> {
        Ok((email.eq_ignore_ascii_case(&self.account.email)).then(|| self.account.clone()))
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<AccountRef>> {
        Ok((account_id == self.account.id).then(|| self.account.clone()))
    }

    async fn verify_password(&self, account: &AccountRef, plaintext: &str) -> Result<bool> {
        Ok(account.id == self.account.id && plaintext == self.password)
    }
}

/// Message channel that records traffic instead of calling Telegram
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(i64, String)>>,
    pub deleted: Mutex<Vec<(i64, Vec<i32>)>>,
    next_message_id: AtomicI32,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            next_message_id: AtomicI32::new(1000),
        }
    }

    pub async fn sent_texts(&self, chat_id: i64) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub async fn last_text(&self, chat_id: i64) -> Option<String> {
        self.sent_texts(chat_id).await.pop()
    }

    pub async fn deleted_ids(&self, chat_id: i64) -> Vec<i32> {
        self.deleted
            .lock()
            .await
            .iter()
            .filter(|(id, _)| *id == chat_id)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    async fn send(&self, chat_id: i64, text: &str, _markup: Option<ButtonRows>) -> Result<i32> {
        self.sent.lock().await.push((chat_id, text.to_string()));
        Ok(self.next_message_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn delete(&self, chat_id: i64, message_ids: &[i32]) {
        self.deleted
            .lock()
            .await
            .push((chat_id, message_ids.to_vec()));
    }
}

/// Inbound private-chat message with an auto-assigned message id
pub fn private_message(chat_id: i64, text: &str) -> ChatMessage {
    static NEXT_ID: AtomicI32 = AtomicI32::new(1);
    ChatMessage {
        chat_id,
        text: text.to_string(),
        message_id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
        previous_message_id: None,
        chat_kind: ChatKind::Private,
        username: Some("tester".to_string()),
        first_name: Some("Test".to_string()),
        language_code: Some("en".to_string()),
    }
}

pub fn group_message(chat_id: i64, text: &str) -> ChatMessage {
    ChatMessage {
        chat_kind: ChatKind::Group,
        ..private_message(chat_id, text)
    }
}
