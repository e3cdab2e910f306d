//! Chat binding repository implementation
//!
//! Bindings are stored append-only: `save` inserts a new snapshot and the
//! current state of a chat is the row with the greatest `event_id`. Lookups
//! therefore always take the latest row first and inspect it, rather than
//! filtering by status in SQL (an older Active row must never shadow a newer
//! Blocked one).

use std::str::FromStr;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::binding::{ChatBinding, ChatBindingStatus, NewChatBinding};
use crate::utils::errors::{Result, TeleAuthError};

/// Persistence contract for the chat-to-account binding
#[async_trait]
pub trait ChatBindingStore: Send + Sync {
    /// Current snapshot for a chat
    async fn find_by_chat(&self, chat_id: i64) -> Result<Option<ChatBinding>>;

    /// Current snapshots of every chat bound to an account
    async fn find_by_account(&self, account_id: Uuid) -> Result<Vec<ChatBinding>>;

    /// Current snapshot for a chat, only if it is Active. This is the lookup
    /// the platform's session authenticator resolves a web login from.
    async fn find_active_by_chat(&self, chat_id: i64) -> Result<Option<ChatBinding>>;

    /// Append a new versioned snapshot
    async fn save(&self, binding: NewChatBinding) -> Result<ChatBinding>;

    /// Delete every snapshot of every chat bound to an account, so the
    /// chats restart from first contact
    async fn remove(&self, account_id: Uuid) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct PgChatBindingRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct BindingRow {
    chat_id: i64,
    account_id: Option<Uuid>,
    status: String,
    username: Option<String>,
    first_name: Option<String>,
    event_id: i64,
    created_at: DateTime<Utc>,
}

impl BindingRow {
    fn into_binding(self) -> Result<ChatBinding> {
        Ok(ChatBinding {
            chat_id: self.chat_id,
            account_id: self.account_id,
            status: ChatBindingStatus::from_str(&self.status)?,
            username: self.username,
            first_name: self.first_name,
            event_id: self.event_id,
            created_at: self.created_at,
        })
    }
}

const BINDING_COLUMNS: &str =
    "chat_id, account_id, status, username, first_name, event_id, created_at";

impl PgChatBindingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatBindingStore for PgChatBindingRepository {
    async fn find_by_chat(&self, chat_id: i64) -> Result<Option<ChatBinding>> {
        let row = sqlx::query_as::<_, BindingRow>(&format!(
            "SELECT {BINDING_COLUMNS} FROM chat_binding WHERE chat_id = $1 \
             ORDER BY event_id DESC LIMIT 1"
        ))
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(BindingRow::into_binding).transpose()
    }

    async fn find_by_account(&self, account_id: Uuid) -> Result<Vec<ChatBinding>> {
        // A chat counts as bound only if its latest snapshot carries this
        // account; older rows referencing it are history.
        let rows = sqlx::query_as::<_, BindingRow>(&format!(
            "SELECT {BINDING_COLUMNS} FROM chat_binding b \
             WHERE account_id = $1 AND event_id = \
               (SELECT max(event_id) FROM chat_binding WHERE chat_id = b.chat_id) \
             ORDER BY chat_id"
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BindingRow::into_binding).collect()
    }

    async fn find_active_by_chat(&self, chat_id: i64) -> Result<Option<ChatBinding>> {
        let binding = self.find_by_chat(chat_id).await?;
        Ok(binding.filter(ChatBinding::is_active))
    }

    async fn save(&self, binding: NewChatBinding) -> Result<ChatBinding> {
        if binding.chat_id == 0 {
            return Err(TeleAuthError::BindingValidation(
                "chat_id must not be zero".to_string()
            ));
        }

        let row = sqlx::query_as::<_, BindingRow>(&format!(
            "INSERT INTO chat_binding (chat_id, account_id, status, username, first_name, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {BINDING_COLUMNS}"
        ))
        .bind(binding.chat_id)
        .bind(binding.account_id)
        .bind(binding.status.as_str())
        .bind(binding.username)
        .bind(binding.first_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        row.into_binding()
    }

    async fn remove(&self, account_id: Uuid) -> Result<()> {
        // The whole chat history goes, not just the rows naming the account;
        // a surviving first-contact snapshot would keep the chat mid-flow.
        sqlx::query(
            "DELETE FROM chat_binding WHERE chat_id IN \
             (SELECT chat_id FROM chat_binding WHERE account_id = $1)"
        )
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
