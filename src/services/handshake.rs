//! QR / short-code handshake
//!
//! The public web page calls `issue` to obtain a token (rendered as a QR
//! code) and a 4-digit code with a 60-second countdown; the bot webhook calls
//! `verify` when a chat presents the token and `redeem` once the code has
//! been delivered. The store-side entry outlives the session-side one by ten
//! seconds so a code scanned at the very end of the countdown can still be
//! delivered to the chat.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::services::code_store::CodeStore;
use crate::utils::errors::Result;

/// Handshake timing configuration
#[derive(Debug, Clone, Copy)]
pub struct HandshakeConfig {
    /// Lifetime of the web-session entry (governs page countdown and reuse)
    pub session_ttl: Duration,
    /// Lifetime of the bot-side code entry (governs redemption)
    pub code_ttl: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(60),
            code_ttl: Duration::from_secs(70),
        }
    }
}

impl From<&AuthConfig> for HandshakeConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            session_ttl: Duration::from_secs(config.handshake_session_ttl_seconds),
            code_ttl: Duration::from_secs(config.handshake_code_ttl_seconds),
        }
    }
}

/// One issued token/code pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedCode {
    /// QR payload and store key
    pub token: Uuid,
    /// 4-digit human-readable code
    pub code: String,
    /// Session-side validity end, for the page countdown
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies one-time codes bound to a client session
#[derive(Clone)]
pub struct HandshakeCoordinator {
    store: Arc<dyn CodeStore>,
    config: HandshakeConfig,
}

impl HandshakeCoordinator {
    pub fn new(store: Arc<dyn CodeStore>, config: HandshakeConfig) -> Self {
        Self { store, config }
    }

    fn client_key(client_key: &str) -> String {
        format!("handshake:client:{}", client_key)
    }

    fn token_key(token: &Uuid) -> String {
        format!("handshake:token:{}", token)
    }

    /// Issue a code for a client session, or return the unexpired one already
    /// issued for it. `client_key` identifies the requesting client (the
    /// caller typically uses the client IP).
    pub async fn issue(&self, client_key: &str) -> Result<IssuedCode> {
        let session_key = Self::client_key(client_key);

        if let Some(raw) = self.store.get(&session_key).await? {
            if let Ok(existing) = serde_json::from_str::<IssuedCode>(&raw) {
                if existing.expires_at > Utc::now() {
                    debug!(client = client_key, token = %existing.token,
                           "Reusing unexpired handshake code");
                    return Ok(existing);
                }
            }
        }

        let issued = IssuedCode {
            token: Uuid::new_v4(),
            code: rand::thread_rng().gen_range(1000..=9999).to_string(),
            expires_at: Utc::now()
                + chrono::Duration::seconds(self.config.session_ttl.as_secs() as i64),
        };

        self.store
            .set(&Self::token_key(&issued.token), &issued.code, self.config.code_ttl)
            .await?;
        self.store
            .set(&session_key, &serde_json::to_string(&issued)?, self.config.session_ttl)
            .await?;

        debug!(client = client_key, token = %issued.token, "Issued handshake code");
        Ok(issued)
    }

    /// Look up the code for a presented token. `None` means unknown or
    /// expired; the caller must abort without side effects.
    pub async fn verify(&self, token: &Uuid) -> Result<Option<String>> {
        self.store.get(&Self::token_key(token)).await
    }

    /// Make a token single-use after its code has been delivered. Redeeming
    /// an unknown or already-redeemed token is a no-op.
    pub async fn redeem(&self, token: &Uuid) -> Result<()> {
        let existed = self.store.delete(&Self::token_key(token)).await?;
        debug!(token = %token, existed = existed, "Redeemed handshake token");
        Ok(())
    }
}
