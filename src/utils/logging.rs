//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging
//! utilities for the TeleAuth application.

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use crate::config::LoggingConfig;
use crate::utils::errors::Result;

/// Initialize logging based on configuration.
///
/// The returned guard flushes the rolling file writer; the caller must keep
/// it alive for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "teleauth.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking))
        .init();

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log authentication events with structured data
pub fn log_auth_event(chat_id: i64, event: &str, success: bool, details: Option<&str>) {
    if success {
        info!(
            chat_id = chat_id,
            event = event,
            details = details,
            "Authentication event"
        );
    } else {
        warn!(
            chat_id = chat_id,
            event = event,
            details = details,
            "Authentication event failed"
        );
    }
}
