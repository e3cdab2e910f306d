//! Database repositories

pub mod binding;

pub use binding::{ChatBindingStore, PgChatBindingRepository};
