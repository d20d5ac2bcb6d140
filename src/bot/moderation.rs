//! Moderation actions: admin checks, muting, unmuting and kicking chat members

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{ChatPermissions, ReplyParameters};
use teloxide::{ApiError, RequestError};
use tracing::{debug, info, warn};

use super::ui_builder::{
    kick_message, parse_kick_args, parse_mute_args, restriction_message, user_not_found_message,
    ADMIN_ONLY, KICK_USAGE, MUTE_USAGE, UNMUTE_USAGE,
};
use super::BotState;
use crate::chat_state::ChatUser;
use crate::errors::error_logging;
use crate::observability;

/// Whether the sender of `msg` administrates the chat
///
/// Private chats have no administrators.
pub async fn is_chat_admin(bot: &Bot, msg: &Message) -> Result<bool> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(false);
    };
    if msg.chat.is_private() {
        return Ok(false);
    }

    let member = bot.get_chat_member(msg.chat.id, user.id).await?;
    Ok(member.is_privileged())
}

/// Reply with the admin-only notice when the sender is not an admin
///
/// Returns `true` when the command may proceed.
pub async fn ensure_chat_admin(bot: &Bot, msg: &Message) -> Result<bool> {
    let is_admin = match is_chat_admin(bot, msg).await {
        Ok(is_admin) => is_admin,
        Err(e) => {
            error_logging::log_telegram_error(
                &e,
                "get_chat_member",
                Some(msg.chat.id.0),
                msg.from.as_ref().map(|user| user.id.0),
            );
            false
        }
    };

    if !is_admin {
        debug!(chat_id = %msg.chat.id, "Rejected admin-only command");
        reply(bot, msg, ADMIN_ONLY).await?;
    }
    Ok(is_admin)
}

async fn reply(bot: &Bot, msg: &Message, text: impl Into<String>) -> Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Restrict a member from sending anything for `duration`
///
/// Already-muted members are left alone. Once the duration has passed the
/// stored mute flag is cleared again.
pub async fn mute_user(
    bot: &Bot,
    state: &Arc<BotState>,
    chat_id: ChatId,
    user: &ChatUser,
    duration: Duration,
    reason: Option<&str>,
) -> bool {
    if user.muted && !user.mute_expired(Utc::now()) {
        debug!(chat_id = %chat_id, user_id = %user.id, "User already muted");
        return true;
    }

    let until = i64::try_from(duration.as_secs())
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| Utc::now().checked_add_signed(delta));
    let Some(until) = until else {
        warn!(duration_secs = %duration.as_secs(), "Mute duration out of range");
        observability::record_moderation_action("mute", false);
        return false;
    };

    info!(chat_id = %chat_id, user_id = %user.id, reason = ?reason, "Muting user");
    let result = bot
        .restrict_chat_member(chat_id, UserId(user.id), ChatPermissions::empty())
        .until_date(until)
        .await;

    match result {
        Ok(_) => {
            observability::record_moderation_action("mute", true);
            state.chats.mute_until(chat_id.0, user.id, until);
            state.persist();

            let announcement = restriction_message(&user.name, duration, reason);
            if let Err(e) = bot
                .send_message(chat_id, announcement)
                .disable_notification(true)
                .await
            {
                error_logging::log_telegram_error(&e, "send_message", Some(chat_id.0), Some(user.id));
            }

            schedule_unmute_flag(Arc::clone(state), chat_id.0, user.id, until);
            true
        }
        Err(e) => {
            observability::record_moderation_action("mute", false);
            error_logging::log_moderation_error(&e, "mute", chat_id.0, &user.name);

            if matches!(e, RequestError::Api(ApiError::CantDemoteChatCreator)) {
                let message = format!(
                    "Sadly, user {} couldn't be restricted due to: `{}`. Shame on {}",
                    user.name, e, user.name
                );
                if let Err(e) = bot.send_message(chat_id, message).await {
                    error_logging::log_telegram_error(&e, "send_message", Some(chat_id.0), Some(user.id));
                }
            }
            false
        }
    }
}

/// Clear the stored mute flag once `until` has passed
pub fn schedule_unmute_flag(
    state: Arc<BotState>,
    chat_id: i64,
    user_id: u64,
    until: DateTime<Utc>,
) {
    info!(
        chat_id = %chat_id,
        user_id = %user_id,
        until = %until,
        "Scheduled reset of mute flag"
    );
    tokio::spawn(async move {
        loop {
            let remaining = (until - Utc::now()).to_std().unwrap_or_default();
            if remaining.is_zero() {
                break;
            }
            tokio::time::sleep(remaining).await;
        }
        if state.chats.expire_mute(chat_id, user_id, Utc::now()) {
            debug!(chat_id = %chat_id, user_id = %user_id, "Mute flag reset");
            state.persist();
        }
    });
}

/// Give a member back all permissions
pub async fn unmute_user(bot: &Bot, state: &BotState, chat_id: ChatId, user: &ChatUser) -> bool {
    let result = bot
        .restrict_chat_member(chat_id, UserId(user.id), ChatPermissions::all())
        .await;

    match result {
        Ok(_) => {
            observability::record_moderation_action("unmute", true);
            state.chats.set_muted(chat_id.0, user.id, false);
            state.persist();
            true
        }
        Err(e) => {
            observability::record_moderation_action("unmute", false);
            error_logging::log_moderation_error(&e, "unmute", chat_id.0, &user.name);
            false
        }
    }
}

/// Handle `/mute <user> [<minutes>] [<reason>]`
pub async fn handle_mute_command(
    bot: &Bot,
    msg: &Message,
    state: &Arc<BotState>,
    args: &str,
) -> Result<()> {
    let Some(args) = parse_mute_args(args, state.mute_default_minutes) else {
        warn!("No arguments have been provided, don't execute `mute`");
        return reply(bot, msg, MUTE_USAGE).await;
    };

    match state.chats.find_user_by_name(msg.chat.id.0, &args.username, false) {
        Some(user) => {
            mute_user(bot, state, msg.chat.id, &user, args.duration, args.reason.as_deref()).await;
        }
        None => {
            warn!(username = %args.username, chat_id = %msg.chat.id, "Mute target not found");
            reply(bot, msg, user_not_found_message("mute", &args.username)).await?;
        }
    }
    Ok(())
}

/// Handle `/unmute <user>` and `/unmute @all`
pub async fn handle_unmute_command(
    bot: &Bot,
    msg: &Message,
    state: &Arc<BotState>,
    args: &str,
) -> Result<()> {
    let Some(username) = args.split_whitespace().next() else {
        warn!("No arguments have been provided, don't execute `unmute`");
        return reply(bot, msg, UNMUTE_USAGE).await;
    };

    let chat_id = msg.chat.id;

    if username == "@all" {
        for user in state.chats.users_sorted(chat_id.0) {
            unmute_user(bot, state, chat_id, &user).await;
        }
        return Ok(());
    }

    match state.chats.find_user_by_name(chat_id.0, username, true) {
        Some(user) => {
            let text = if unmute_user(bot, state, chat_id, &user).await {
                format!("Successfully unmuted {}.", username)
            } else {
                format!("Failed to unmute {}.", username)
            };
            reply(bot, msg, text).await?;
        }
        None => {
            warn!(username = %username, chat_id = %chat_id, "Unmute target not found");
            reply(bot, msg, user_not_found_message("unmute", username)).await?;
        }
    }
    Ok(())
}

/// Handle `/kick <user> [<reason>]`
pub async fn handle_kick_command(
    bot: &Bot,
    msg: &Message,
    state: &Arc<BotState>,
    args: &str,
) -> Result<()> {
    let Some(args) = parse_kick_args(args) else {
        warn!("No arguments have been provided, don't execute `kick`");
        return reply(bot, msg, KICK_USAGE).await;
    };

    let chat_id = msg.chat.id;
    let Some(user) = state.chats.find_user_by_name(chat_id.0, &args.username, false) else {
        warn!(username = %args.username, chat_id = %chat_id, "Kick target not found");
        return reply(bot, msg, user_not_found_message("kick", &args.username)).await;
    };

    match bot.ban_chat_member(chat_id, UserId(user.id)).await {
        Ok(_) => {
            observability::record_moderation_action("kick", true);
            state.chats.remove_user(chat_id.0, user.id);
            state.persist();

            let text = kick_message(&user.name, args.reason.as_deref());
            debug!("{}", text);
            reply(bot, msg, text).await
        }
        Err(e) => {
            observability::record_moderation_action("kick", false);
            error_logging::log_moderation_error(&e, "kick", chat_id.0, &user.name);
            let text = format!("Couldn't remove {} from chat due to error ({})", user.name, e);
            reply(bot, msg, text).await
        }
    }
}
