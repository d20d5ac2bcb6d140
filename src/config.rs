//! # Unified Application Configuration
//!
//! Collects every setting of the bot into a single structure loaded from
//! environment variables, with per-section validation.

use crate::errors::{AppError, AppResult};
use crate::observability_config::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Bot-specific configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Telegram bot token
    pub token: String,
    /// HTTP client timeout in seconds
    pub http_timeout_secs: u64,
    /// Default mute duration when `/mute` gets no minutes argument
    pub mute_default_minutes: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            http_timeout_secs: 30,
            mute_default_minutes: 15,
        }
    }
}

impl BotConfig {
    /// Validate bot configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.token.trim().is_empty() {
            return Err(AppError::Config("Bot token cannot be empty".to_string()));
        }

        // Telegram tokens look like "<numeric bot id>:<secret>"
        let Some((bot_id, secret)) = self.token.split_once(':') else {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        };

        if secret.contains(':') {
            return Err(AppError::Config(
                "Bot token format is invalid. Expected format: 'bot_id:bot_token'".to_string(),
            ));
        }

        if bot_id.parse::<u64>().is_err() {
            return Err(AppError::Config(
                "Bot token bot ID must be numeric".to_string(),
            ));
        }

        if secret.len() < 20 {
            return Err(AppError::Config(
                "Bot token appears to be too short. Please verify it's a valid token".to_string(),
            ));
        }

        if self.http_timeout_secs == 0 {
            return Err(AppError::Config("HTTP timeout cannot be 0".to_string()));
        }

        if self.http_timeout_secs > 300 {
            return Err(AppError::Config(
                "HTTP timeout cannot be greater than 300 seconds".to_string(),
            ));
        }

        if self.mute_default_minutes == 0 {
            return Err(AppError::Config(
                "Default mute duration cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Chat state persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// JSON file holding chats and their members
    pub filepath: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            filepath: PathBuf::from("state.json"),
        }
    }
}

impl StateConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.filepath.as_os_str().is_empty() {
            return Err(AppError::Config("State file path cannot be empty".to_string()));
        }
        if self.filepath.is_dir() {
            return Err(AppError::Config(format!(
                "State file path {} is a directory",
                self.filepath.display()
            )));
        }
        Ok(())
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Bot configuration
    pub bot: BotConfig,
    /// State persistence configuration
    pub state: StateConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        let raw_token = env::var("BOT_TOKEN")
            .or_else(|_| env::var("TELEGRAM_BOT_TOKEN"))
            .map_err(|_| {
                AppError::Config("BOT_TOKEN environment variable is required".to_string())
            })?;
        config.bot.token = raw_token.trim().to_string();
        config.bot.http_timeout_secs = env::var("HTTP_CLIENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| {
                AppError::Config("HTTP_CLIENT_TIMEOUT_SECS must be a valid number".to_string())
            })?;
        config.bot.mute_default_minutes = env::var("MUTE_DEFAULT_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .map_err(|_| {
                AppError::Config("MUTE_DEFAULT_MINUTES must be a valid number".to_string())
            })?;

        if let Ok(path) = env::var("STATE_FILEPATH") {
            config.state.filepath = PathBuf::from(path);
        }

        config.observability = ObservabilityConfig::from_env();

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.bot.validate()?;
        self.state.validate()?;
        self.observability.validate().map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: bot_token=[REDACTED], state_file={}, http_timeout_secs={}, metrics_port={}, environment={}",
            self.state.filepath.display(),
            self.bot.http_timeout_secs,
            self.observability.metrics_port,
            self.observability.environment
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = AppConfig::default();
        // Default token is empty
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bot_config_validation() {
        let mut config = BotConfig::default();

        // Invalid: empty token
        assert!(config.validate().is_err());

        // Invalid: malformed token
        config.token = "invalid-token".to_string();
        assert!(config.validate().is_err());

        // Invalid: short token
        config.token = "123:short".to_string();
        assert!(config.validate().is_err());

        // Invalid: non-numeric bot id
        config.token = "abc:AAFakeTokenForTestingPurposes1234567890".to_string();
        assert!(config.validate().is_err());

        // Valid token format
        config.token = "123456789:AAFakeTokenForTestingPurposes1234567890".to_string();
        assert!(config.validate().is_ok());

        // Invalid: zero timeout
        config.http_timeout_secs = 0;
        assert!(config.validate().is_err());
        config.http_timeout_secs = 301;
        assert!(config.validate().is_err());
        config.http_timeout_secs = 30;

        // Invalid: zero mute duration
        config.mute_default_minutes = 0;
        assert!(config.validate().is_err());
        config.mute_default_minutes = 15;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_state_config_validation() {
        let mut config = StateConfig::default();
        assert!(config.validate().is_ok());

        config.filepath = PathBuf::new();
        assert!(config.validate().is_err());

        config.filepath = std::env::temp_dir();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_summary_redacts_token() {
        let mut config = AppConfig::default();
        config.bot.token = "123456789:AAFakeTokenForTestingPurposes1234567890".to_string();
        let summary = config.summary();
        assert!(summary.contains("[REDACTED]"));
        assert!(!summary.contains("AAFakeToken"));
    }
}
