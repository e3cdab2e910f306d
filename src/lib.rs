//! TeleAuth Telegram Authentication Bot
//!
//! Account authentication over a Telegram bot: links chats to platform
//! accounts through an email/password registration dialogue, runs a
//! conversational login state machine, and confirms browser sign-ins by
//! delivering short verification codes for QR-initiated handshakes.

#![allow(non_snake_case)]

pub mod config;
pub mod handlers;
pub mod services;
pub mod models;
pub mod database;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{TeleAuthError, Result};

// Re-export main components for easy access
pub use database::repositories::{ChatBindingStore, PgChatBindingRepository};
pub use handlers::{BanPropagationHandler, RegistrationFlow};
pub use services::{HandshakeCoordinator, LoginService};
pub use state::{LoginStep, LoginStepMachine, SessionStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
