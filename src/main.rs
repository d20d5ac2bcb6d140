use anyhow::Result;
use cure_freedom_bot::bot::{self, moderation, BotState, Command};
use cure_freedom_bot::chat_state::ChatRegistry;
use cure_freedom_bot::config::AppConfig;
use cure_freedom_bot::errors::error_logging;
use cure_freedom_bot::observability;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().inspect_err(|e| {
        error_logging::log_config_error(e, "environment", "load_config");
    })?;
    config.validate().inspect_err(|e| {
        error_logging::log_config_error(e, "environment", "validate_config");
    })?;

    // Initialize complete observability stack (metrics, tracing, logging)
    observability::init_observability_with_config(config.observability.clone()).await?;
    info!("{}", config.summary());

    let chats = match ChatRegistry::load(&config.state.filepath) {
        Ok(chats) => chats,
        Err(e) => {
            let path = config.state.filepath.display().to_string();
            error_logging::log_state_error(&e, "load", Some(&path));
            return Err(e.into());
        }
    };
    let state = Arc::new(BotState::new(chats, config.bot.mute_default_minutes));

    // Mutes still running from before the restart
    for (chat_id, user_id, until) in state.chats.pending_unmutes() {
        moderation::schedule_unmute_flag(Arc::clone(&state), chat_id, user_id, until);
    }

    // Initialize the bot with custom client configuration for better reliability
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bot.http_timeout_secs))
        .build()?;

    let bot = Bot::with_client(config.bot.token.clone(), client);

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    info!(
        timeout_secs = config.bot.http_timeout_secs,
        "Bot initialized, starting dispatcher"
    );

    Dispatcher::builder(bot, bot::schema(Arc::clone(&state)))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    state.persist();
    info!("Dispatcher stopped, chat state saved");

    Ok(())
}
