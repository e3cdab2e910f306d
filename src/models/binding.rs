//! Chat binding model
//!
//! A `ChatBinding` links one Telegram chat to one platform account. Bindings
//! are append-only: every mutation inserts a new snapshot with a
//! strictly-increasing `event_id`, and the snapshot with the greatest
//! `event_id` per chat is the current one. Older rows remain for audit.

use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a chat binding.
///
/// A closed set: `New` is a chat that started registration but has not proven
/// account ownership yet, `Active` is usable for web-session login, `Blocked`
/// is disabled (administratively or propagated from a blocked email account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatBindingStatus {
    New,
    Active,
    Blocked,
}

impl ChatBindingStatus {
    /// Canonical sort order for admin listings
    pub const fn priority(&self) -> u16 {
        match self {
            ChatBindingStatus::New => 100,
            ChatBindingStatus::Active => 200,
            ChatBindingStatus::Blocked => 300,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ChatBindingStatus::New => "new",
            ChatBindingStatus::Active => "active",
            ChatBindingStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for ChatBindingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatBindingStatus {
    type Err = crate::utils::errors::TeleAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ChatBindingStatus::New),
            "active" => Ok(ChatBindingStatus::Active),
            "blocked" => Ok(ChatBindingStatus::Blocked),
            other => Err(crate::utils::errors::TeleAuthError::InvalidInput(
                format!("Unknown chat binding status: {}", other)
            )),
        }
    }
}

/// One snapshot of the chat-to-account relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatBinding {
    pub chat_id: i64,
    pub account_id: Option<Uuid>,
    pub status: ChatBindingStatus,
    pub username: Option<String>,
    pub first_name: Option<String>,
    /// Strictly-increasing snapshot version
    pub event_id: i64,
    pub created_at: DateTime<Utc>,
}

impl ChatBinding {
    pub fn is_blocked(&self) -> bool {
        self.status == ChatBindingStatus::Blocked
    }

    pub fn is_active(&self) -> bool {
        self.status == ChatBindingStatus::Active
    }
}

/// Insert request for a new binding snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChatBinding {
    pub chat_id: i64,
    pub account_id: Option<Uuid>,
    pub status: ChatBindingStatus,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl NewChatBinding {
    /// Next snapshot for an existing binding, carrying every field over
    pub fn from_snapshot(binding: &ChatBinding) -> Self {
        Self {
            chat_id: binding.chat_id,
            account_id: binding.account_id,
            status: binding.status,
            username: binding.username.clone(),
            first_name: binding.first_name.clone(),
        }
    }

    pub fn with_status(mut self, status: ChatBindingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [ChatBindingStatus::New, ChatBindingStatus::Active, ChatBindingStatus::Blocked] {
            assert_eq!(status.as_str().parse::<ChatBindingStatus>().unwrap(), status);
        }
        assert!("banned".parse::<ChatBindingStatus>().is_err());
    }

    #[test]
    fn test_status_priority_order() {
        assert!(ChatBindingStatus::New.priority() < ChatBindingStatus::Active.priority());
        assert!(ChatBindingStatus::Active.priority() < ChatBindingStatus::Blocked.priority());
        assert_eq!(ChatBindingStatus::Blocked.priority(), 300);
    }

    #[test]
    fn test_next_snapshot_carries_fields() {
        let binding = ChatBinding {
            chat_id: 555,
            account_id: Some(Uuid::new_v4()),
            status: ChatBindingStatus::New,
            username: Some("user".to_string()),
            first_name: Some("User".to_string()),
            event_id: 7,
            created_at: Utc::now(),
        };

        let next = NewChatBinding::from_snapshot(&binding).with_status(ChatBindingStatus::Active);
        assert_eq!(next.chat_id, binding.chat_id);
        assert_eq!(next.account_id, binding.account_id);
        assert_eq!(next.status, ChatBindingStatus::Active);
        assert_eq!(next.username, binding.username);
    }
}
