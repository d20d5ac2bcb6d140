//! Message Handler module for processing non-command Telegram messages

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{FileId, InputFile, Me, ReplyParameters};
use tracing::{debug, info, Instrument};

use super::ui_builder::display_name;
use super::BotState;
use crate::chat_state::ChatUser;
use crate::errors::error_logging;
use crate::observability;

pub const NH_STICKER_ID: &str =
    "CAACAgIAAxkBAAIMHmAPFkBuPZpefXalATwEaInrpyEKAAIPAAPgLXoN0KhdkOTTb1EeBA";

lazy_static! {
    static ref NH_TRIGGER: Regex = Regex::new(r"(?i)\bnh\b").expect("valid nh trigger regex");
}

/// Whether a message text should be answered with the nh sticker
pub fn is_nh_trigger(text: &str) -> bool {
    NH_TRIGGER.is_match(text)
}

/// Reply to `msg` with the nh sticker
pub async fn send_nh_sticker(bot: &Bot, msg: &Message) -> Result<()> {
    bot.send_sticker(msg.chat.id, InputFile::file_id(FileId(NH_STICKER_ID.to_string())))
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Handle every message that is not a known command
pub async fn message_handler(bot: Bot, msg: Message, me: Me, state: Arc<BotState>) -> Result<()> {
    let span = observability::telegram_span("message", Some(msg.chat.id.0));
    async move {
        observability::record_telegram_message("message");

        let changed = update_membership(&msg, &me, &state);
        if changed {
            state.persist();
        }

        let text = msg.text().or_else(|| msg.caption());
        if let Some(text) = text {
            debug!(text_length = text.len(), "Handling message");
            if is_nh_trigger(text) {
                if let Err(e) = send_nh_sticker(&bot, &msg).await {
                    error_logging::log_telegram_error(
                        &e,
                        "send_sticker",
                        Some(msg.chat.id.0),
                        msg.from.as_ref().map(|user| user.id.0),
                    );
                }
            }
        }

        Ok(())
    }
    .instrument(span)
    .await
}

/// Apply membership changes carried by `msg` to the chat registry
///
/// Returns `true` when the registry changed.
pub fn update_membership(msg: &Message, me: &Me, state: &BotState) -> bool {
    let chat_id = msg.chat.id.0;
    let title = msg.chat.title();

    if let Some(to_id) = msg.migrate_to_chat_id() {
        info!(from_id = %chat_id, to_id = %to_id, "Migrating chat");
        return state.chats.migrate_chat(chat_id, to_id.0);
    }

    if let Some(members) = msg.new_chat_members() {
        info!(chat_id = %chat_id, count = members.len(), "New member(s) have joined this chat");
        let mut changed = false;
        for member in members.iter().filter(|member| member.id != me.id) {
            let user = ChatUser::new(member.id.0, display_name(member));
            changed |= state.chats.register_user(chat_id, title, user);
        }
        return changed;
    }

    if let Some(member) = msg.left_chat_member() {
        if member.id == me.id {
            info!(chat_id = %chat_id, "Bot left chat, forgetting it");
            return state.chats.remove_chat(chat_id).is_some();
        }
        return state.chats.remove_user(chat_id, member.id.0).is_some();
    }

    if let Some(new_title) = msg.new_chat_title() {
        state.chats.ensure_chat(chat_id, Some(new_title));
        return true;
    }

    match msg.from.as_ref() {
        Some(author) if !author.is_bot => {
            let user = ChatUser::new(author.id.0, display_name(author));
            state.chats.register_user(chat_id, title, user)
        }
        _ => false,
    }
}
