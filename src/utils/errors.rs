//! Error handling for TeleAuth
//!
//! This module defines the main error type used throughout the application
//! and provides a unified error handling strategy. Conversational negatives
//! (unknown email, wrong password, expired code) are NOT errors; they are
//! modeled as `Option`/step variants and handled in place. `TeleAuthError`
//! is reserved for infrastructure failures.

use thiserror::Error;

/// Main error type for the TeleAuth application
#[derive(Error, Debug)]
pub enum TeleAuthError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Binding validation failed: {0}")]
    BindingValidation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Result type alias for TeleAuth operations
pub type Result<T> = std::result::Result<T, TeleAuthError>;

impl TeleAuthError {
    /// Check if the error is recoverable (a retry may succeed)
    pub fn is_recoverable(&self) -> bool {
        match self {
            TeleAuthError::Database(_) => false,
            TeleAuthError::Migration(_) => false,
            TeleAuthError::Telegram(_) => true,
            TeleAuthError::Redis(_) => true,
            TeleAuthError::Serialization(_) => false,
            TeleAuthError::Io(_) => true,
            TeleAuthError::Config(_) => false,
            TeleAuthError::InvalidInput(_) => false,
            TeleAuthError::BindingValidation(_) => false,
            TeleAuthError::ServiceUnavailable(_) => true,
        }
    }
}
