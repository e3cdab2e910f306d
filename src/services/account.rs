//! Platform account lookup service
//!
//! The platform's identity provider owns accounts; this core only needs to
//! resolve an active account by email, re-resolve it by id at the password
//! step, and check a plaintext password against the stored credential hash.
//! The hash is treated as an opaque PHC string; anything argon2 cannot parse
//! simply verifies as false.

use async_trait::async_trait;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::utils::errors::Result;

/// Reference to a platform account resolved for authentication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRef {
    pub id: Uuid,
    pub email: String,
    password_hash: String,
}

impl AccountRef {
    pub fn new(id: Uuid, email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }

    pub(crate) fn password_hash(&self) -> &str {
        &self.password_hash
    }
}

/// External identity provider contract
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// Resolve an account by email, only if its status is active
    async fn find_active_by_email(&self, email: &str) -> Result<Option<AccountRef>>;

    /// Re-resolve an account previously associated with a binding
    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<AccountRef>>;

    /// Opaque password check; false covers wrong passwords and unreadable hashes
    async fn verify_password(&self, account: &AccountRef, plaintext: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct PgAccountLookup {
    pool: PgPool,
}

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: String,
}

impl AccountRow {
    fn into_ref(self) -> AccountRef {
        AccountRef::new(self.id, self.email, self.password_hash)
    }
}

impl PgAccountLookup {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountLookup for PgAccountLookup {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<AccountRef>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash FROM account \
             WHERE lower(email) = lower($1) AND status = 'active'"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountRow::into_ref))
    }

    async fn find_by_id(&self, account_id: Uuid) -> Result<Option<AccountRef>> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash FROM account WHERE id = $1"
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(AccountRow::into_ref))
    }

    async fn verify_password(&self, account: &AccountRef, plaintext: &str) -> Result<bool> {
        Ok(verify_phc(account.password_hash(), plaintext))
    }
}

/// Verify a plaintext against an argon2 PHC-string hash
pub(crate) fn verify_phc(hash: &str, plaintext: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{rand_core::OsRng, SaltString};
    use argon2::PasswordHasher;

    fn hash(plaintext: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_verify_phc_accepts_correct_password() {
        let phc = hash("correct horse");
        assert!(verify_phc(&phc, "correct horse"));
        assert!(!verify_phc(&phc, "wrong horse"));
    }

    #[test]
    fn test_verify_phc_rejects_garbage_hash() {
        assert!(!verify_phc("not-a-phc-string", "anything"));
        assert!(!verify_phc("", "anything"));
    }
}
