//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `commands`: Parsing and dispatching of slash commands
//! - `message_handler`: Plain messages, membership tracking and the nh sticker
//! - `moderation`: Admin checks, mute, unmute and kick
//! - `ui_builder`: Reply texts and argument parsing

pub mod commands;
pub mod message_handler;
pub mod moderation;
pub mod ui_builder;

use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::Me;

use crate::chat_state::ChatRegistry;
use crate::errors::error_logging;

pub use commands::{handle_command, Command};
pub use message_handler::message_handler;

/// State shared by all handlers
#[derive(Debug)]
pub struct BotState {
    pub chats: ChatRegistry,
    pub mute_default_minutes: u64,
}

impl BotState {
    pub fn new(chats: ChatRegistry, mute_default_minutes: u64) -> Self {
        Self {
            chats,
            mute_default_minutes,
        }
    }

    /// Save the chat registry, logging failures
    pub fn persist(&self) {
        if let Err(e) = self.chats.save() {
            let path = self.chats.path().map(|p| p.display().to_string());
            error_logging::log_state_error(&e, "save", path.as_deref());
        }
    }
}

/// Build the update handler tree
///
/// Known commands go to [`handle_command`], everything else to
/// [`message_handler`].
pub fn schema(state: Arc<BotState>) -> UpdateHandler<anyhow::Error> {
    let command_handler = Update::filter_message()
        .filter_command::<Command>()
        .endpoint({
            let state = Arc::clone(&state);
            move |bot: Bot, msg: Message, cmd: Command| {
                let state = Arc::clone(&state);
                async move { handle_command(bot, msg, cmd, state).await }
            }
        });

    let plain_message_handler = Update::filter_message().endpoint({
        let state = Arc::clone(&state);
        move |bot: Bot, msg: Message, me: Me| {
            let state = Arc::clone(&state);
            async move { message_handler(bot, msg, me, state).await }
        }
    });

    dptree::entry()
        .branch(command_handler)
        .branch(plain_message_handler)
}
