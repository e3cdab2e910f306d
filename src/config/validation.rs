//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{Result, TeleAuthError};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_auth_config(&settings.auth)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(TeleAuthError::Config(
            "Bot token is required".to_string()
        ));
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(TeleAuthError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(TeleAuthError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(TeleAuthError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(TeleAuthError::Config(
            "Redis URL is required".to_string()
        ));
    }

    Ok(())
}

/// Validate authentication flow configuration
fn validate_auth_config(config: &super::AuthConfig) -> Result<()> {
    if config.login_session_ttl_seconds == 0 {
        return Err(TeleAuthError::Config(
            "Login session TTL must be greater than 0".to_string()
        ));
    }

    if config.handshake_session_ttl_seconds == 0 {
        return Err(TeleAuthError::Config(
            "Handshake session TTL must be greater than 0".to_string()
        ));
    }

    // The bot-side code entry must outlive the web-side session entry
    if config.handshake_code_ttl_seconds < config.handshake_session_ttl_seconds {
        return Err(TeleAuthError::Config(
            "Handshake code TTL must not be shorter than the session TTL".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(TeleAuthError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(TeleAuthError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
