//! Configuration module
//!
//! Settings loading from TOML files and environment variables

pub mod settings;
pub mod validation;

pub use settings::{AuthConfig, BotConfig, DatabaseConfig, LoggingConfig, RedisConfig, Settings};
