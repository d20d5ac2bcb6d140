//! Command Handlers module for processing bot commands

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ReplyParameters};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, Instrument};

use super::message_handler::send_nh_sticker;
use super::moderation::{
    ensure_chat_admin, handle_kick_command, handle_mute_command, handle_unmute_command,
};
use super::ui_builder::{
    split_messages, MESSAGE_LENGTH_LIMIT, NO_ACTIVE_USERS, NO_CHAT_DATA, UNKNOWN_CHAT,
};
use super::BotState;
use crate::conversion::{handle_conversion_command, list_supported_units};
use crate::observability;

/// Format used by `/server_time`
pub const SERVER_TIME_FORMAT: &str = "%d-%m-%Y %H-%M-%S";

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(
    rename_rule = "snake_case",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "convert a freedom unit, e.g. /cure_freedom 5 ft")]
    CureFreedom(String),
    #[command(description = "short for /cure_freedom")]
    Cf(String),
    #[command(description = "list the units that can be converted")]
    SupportedUnits,
    #[command(description = "nh")]
    Nh,
    #[command(description = "list the known users of this chat or of the chat with the given title")]
    ShowUsers(String),
    #[command(description = "show what the bot knows about this chat")]
    Status,
    #[command(description = "show the bot version")]
    Version,
    #[command(description = "show the server time")]
    ServerTime,
    #[command(description = "download the stored data of this chat")]
    GetData,
    #[command(description = "(admin) mute a user: /mute <user> [<minutes>] [<reason>]")]
    Mute(String),
    #[command(description = "(admin) unmute a user or @all")]
    Unmute(String),
    #[command(description = "(admin) kick a user: /kick <user> [<reason>]")]
    Kick(String),
    #[command(description = "(admin) forget this chat")]
    DeleteChat,
    #[command(description = "show this text")]
    Help,
}

impl Command {
    /// Name used in logs, spans and metrics
    pub fn name(&self) -> &'static str {
        match self {
            Command::CureFreedom(_) => "cure_freedom",
            Command::Cf(_) => "cf",
            Command::SupportedUnits => "supported_units",
            Command::Nh => "nh",
            Command::ShowUsers(_) => "show_users",
            Command::Status => "status",
            Command::Version => "version",
            Command::ServerTime => "server_time",
            Command::GetData => "get_data",
            Command::Mute(_) => "mute",
            Command::Unmute(_) => "unmute",
            Command::Kick(_) => "kick",
            Command::DeleteChat => "delete_chat",
            Command::Help => "help",
        }
    }

    pub fn is_admin_only(&self) -> bool {
        matches!(
            self,
            Command::Mute(_) | Command::Unmute(_) | Command::Kick(_) | Command::DeleteChat
        )
    }
}

/// Entry point for every parsed command
pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> Result<()> {
    let span = observability::telegram_span(cmd.name(), Some(msg.chat.id.0));
    async move {
        observability::record_telegram_message("command");
        info!(command = %cmd.name(), "Handling command");

        state.chats.ensure_chat(msg.chat.id.0, msg.chat.title());

        if cmd.is_admin_only() && !ensure_chat_admin(&bot, &msg).await? {
            return Ok(());
        }

        match cmd {
            Command::CureFreedom(args) | Command::Cf(args) => {
                reply(&bot, &msg, handle_conversion_command(&args)).await
            }
            Command::SupportedUnits => reply(&bot, &msg, list_supported_units()).await,
            Command::Nh => send_nh_sticker(&bot, &msg).await,
            Command::ShowUsers(title) => handle_show_users_command(&bot, &msg, &state, &title).await,
            Command::Status => handle_status_command(&bot, &msg, &state).await,
            Command::Version => reply(&bot, &msg, env!("CARGO_PKG_VERSION")).await,
            Command::ServerTime => {
                let now = chrono::Local::now().format(SERVER_TIME_FORMAT).to_string();
                reply(&bot, &msg, now).await
            }
            Command::GetData => handle_get_data_command(&bot, &msg, &state).await,
            Command::Mute(args) => handle_mute_command(&bot, &msg, &state, &args).await,
            Command::Unmute(args) => handle_unmute_command(&bot, &msg, &state, &args).await,
            Command::Kick(args) => handle_kick_command(&bot, &msg, &state, &args).await,
            Command::DeleteChat => {
                if state.chats.remove_chat(msg.chat.id.0).is_some() {
                    info!(chat_id = %msg.chat.id, "Deleting chat from state");
                    state.persist();
                }
                Ok(())
            }
            Command::Help => reply(&bot, &msg, Command::descriptions().to_string()).await,
        }
    }
    .instrument(span)
    .await
}

async fn reply(bot: &Bot, msg: &Message, text: impl Into<String>) -> Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Handle `/show_users [<chat title>]`
async fn handle_show_users_command(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    title: &str,
) -> Result<()> {
    let title = title.trim();
    let chat_id = if title.is_empty() {
        msg.chat.id.0
    } else {
        match state.chats.find_chat_by_title(title) {
            Some(chat_id) => chat_id,
            None => {
                bot.send_message(msg.chat.id, UNKNOWN_CHAT).await?;
                return Ok(());
            }
        }
    };

    let names: Vec<String> = state
        .chats
        .users_sorted(chat_id)
        .into_iter()
        .map(|user| user.name)
        .collect();

    if names.is_empty() {
        bot.send_message(msg.chat.id, NO_ACTIVE_USERS).await?;
        return Ok(());
    }

    for text in split_messages(&names, MESSAGE_LENGTH_LIMIT) {
        bot.send_message(msg.chat.id, text).await?;
    }
    Ok(())
}

async fn handle_status_command(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let summary = match state.chats.chat(msg.chat.id.0) {
        Some(chat) => chat.summary(),
        None => NO_CHAT_DATA.to_string(),
    };
    reply(bot, msg, summary).await
}

/// Send the stored JSON of this chat as a document
async fn handle_get_data_command(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let chat_id = msg.chat.id.0;

    let Some(json) = state.chats.chat_json(chat_id)? else {
        return reply(bot, msg, NO_CHAT_DATA).await;
    };

    let file_name = match msg.chat.title() {
        Some(title) => format!("{}.json", title),
        None => format!("{}.json", chat_id),
    };
    debug!(chat_id = %chat_id, file_name = %file_name, "Sending chat data");

    let document = InputFile::memory(json.into_bytes()).file_name(file_name);
    bot.send_document(msg.chat.id, document).await?;
    Ok(())
}
