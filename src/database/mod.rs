//! Database module
//!
//! This module handles database connections and operations

pub mod connection;
pub mod repositories;

pub use connection::{create_pool, run_migrations, DatabasePool};
pub use repositories::{ChatBindingStore, PgChatBindingRepository};
