//! # Application Error Types
//!
//! This module defines common error types used throughout the bot.
//! Conversion failures have their own type in [`crate::conversion`] since
//! they are always turned into a reply rather than propagated.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Chat state loading/saving errors
    State(String),
    /// Telegram API errors
    Telegram(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::State(msg) => write!(f, "[STATE] {}", msg),
            AppError::Telegram(msg) => write!(f, "[TELEGRAM] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Config(format!("invalid pattern: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::State(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::State(err.to_string())
    }
}

impl From<teloxide::RequestError> for AppError {
    fn from(err: teloxide::RequestError) -> Self {
        AppError::Telegram(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log Telegram API errors with chat context
    pub fn log_telegram_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: Option<i64>,
        user_id: Option<u64>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = ?chat_id,
            user_id = ?user_id,
            "Telegram operation failed"
        );
    }

    /// Log chat state persistence errors
    pub fn log_state_error(error: &impl std::fmt::Display, operation: &str, path: Option<&str>) {
        error!(
            error = %error,
            operation = %operation,
            path = ?path,
            "Chat state operation failed"
        );
    }

    /// Log moderation failures (mute, unmute, kick)
    pub fn log_moderation_error(
        error: &impl std::fmt::Display,
        action: &str,
        chat_id: i64,
        target: &str,
    ) {
        error!(
            error = %error,
            action = %action,
            chat_id = %chat_id,
            target = %target,
            "Moderation action failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
