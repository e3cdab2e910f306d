//! Short-lived key/value store
//!
//! This service backs everything time-boxed in the authentication core:
//! one-time handshake codes, per-chat login sessions, and the "last bot
//! message" bookkeeping used to clean up prompts. Keys carry a per-item TTL
//! and expire on their own; there is no sweeping.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use crate::config::RedisConfig;
use crate::utils::errors::Result;

/// Generic short-lived key/value store with per-item TTL
#[async_trait]
pub trait CodeStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Returns whether the key existed
    async fn delete(&self, key: &str) -> Result<bool>;
}

/// Redis-backed store
#[derive(Clone)]
pub struct RedisCodeStore {
    connection_manager: redis::aio::ConnectionManager,
    prefix: String,
}

impl RedisCodeStore {
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str())?;
        let connection_manager = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            connection_manager,
            prefix: config.prefix,
        })
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl std::fmt::Debug for RedisCodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCodeStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CodeStore for RedisCodeStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.full_key(key);
        let mut conn = self.connection_manager.clone();

        let value: Option<String> = conn.get(&full_key).await?;
        debug!(key = %full_key, found = value.is_some(), "Store GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let full_key = self.full_key(key);
        let ttl_seconds = ttl.as_secs().max(1);
        let mut conn = self.connection_manager.clone();

        let _: () = conn.set_ex(&full_key, value, ttl_seconds).await?;
        debug!(key = %full_key, ttl_seconds = ttl_seconds, "Store SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let full_key = self.full_key(key);
        let mut conn = self.connection_manager.clone();

        let deleted: u32 = conn.del(&full_key).await?;
        debug!(key = %full_key, deleted = deleted > 0, "Store DEL");
        Ok(deleted > 0)
    }
}

/// In-process store with lazy expiry. Used by the test suite and usable for
/// single-instance deployments without Redis.
#[derive(Debug, Default)]
pub struct MemoryCodeStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get_delete() {
        let store = MemoryCodeStore::new();

        store.set("k", "v", Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        assert!(store.delete("k").await.unwrap());
        assert!(!store.delete("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryCodeStore::new();

        store.set("k", "v", Duration::from_millis(20)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_overwrite_refreshes_ttl() {
        let store = MemoryCodeStore::new();

        store.set("k", "old", Duration::from_millis(20)).await.unwrap();
        store.set("k", "new", Duration::from_secs(60)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), Some("new".to_string()));
    }
}
