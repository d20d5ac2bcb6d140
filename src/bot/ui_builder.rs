//! UI Builder module for formatting replies and parsing command arguments

use std::time::Duration;

use teloxide::types::User;

/// Telegram's maximum message length
pub const MESSAGE_LENGTH_LIMIT: usize = 4096;

/// Reply for `/show_users` when nobody has been seen yet
pub const NO_ACTIVE_USERS: &str =
    "No active users. Users need to write a message in the chat to be recognized (not just a command)";

pub const ADMIN_ONLY: &str = "This command is only available to chat admins.";
pub const MUTE_USAGE: &str =
    "Please provide a user and an optional timeout (/mute <user> [<timeout in minutes>] [<reason>])";
pub const UNMUTE_USAGE: &str = "You have to provide a user which should be unmuted.";
pub const KICK_USAGE: &str = "Please provide a user and an optional reason (/kick <user> [<reason>])";
pub const UNKNOWN_CHAT: &str = "This chat doesn't exist";
pub const NO_CHAT_DATA: &str = "Couldn't find any data for this chat.";

/// Reply when a moderation target is not a known member of the chat
pub fn user_not_found_message(action: &str, username: &str) -> String {
    format!("Can't {} {} (not found in current chat).", action, username)
}

/// Arguments of `/mute <user> [<minutes>] [<reason>]`
#[derive(Debug, Clone, PartialEq)]
pub struct MuteArgs {
    pub username: String,
    pub duration: Duration,
    pub reason: Option<String>,
}

/// Arguments of `/kick <user> [<reason>]`
#[derive(Debug, Clone, PartialEq)]
pub struct KickArgs {
    pub username: String,
    pub reason: Option<String>,
}

/// Name used to address a user: `@username` when set, otherwise the full name
pub fn display_name(user: &User) -> String {
    match &user.username {
        Some(username) => format!("@{}", username),
        None => user.full_name(),
    }
}

/// Parse `/mute` arguments
///
/// An absent or non-numeric minutes value falls back to `default_minutes`;
/// in the non-numeric case that word is not part of the reason either.
pub fn parse_mute_args(args: &str, default_minutes: u64) -> Option<MuteArgs> {
    let mut words = args.split_whitespace();
    let username = words.next()?.to_string();

    let minutes = words.next();
    let minutes_value = match minutes.map(str::parse::<u64>) {
        Some(Ok(value)) => value,
        Some(Err(_)) => {
            tracing::warn!(minutes = ?minutes, "Invalid mute duration, using default");
            default_minutes
        }
        None => default_minutes,
    };

    Some(MuteArgs {
        username,
        duration: Duration::from_secs(minutes_value.saturating_mul(60)),
        reason: join_reason(words),
    })
}

/// Parse `/kick` arguments
pub fn parse_kick_args(args: &str) -> Option<KickArgs> {
    let mut words = args.split_whitespace();
    let username = words.next()?.to_string();

    Some(KickArgs {
        username,
        reason: join_reason(words),
    })
}

fn join_reason<'a>(words: impl Iterator<Item = &'a str>) -> Option<String> {
    let reason = words.collect::<Vec<_>>().join(" ");
    if reason.is_empty() {
        None
    } else {
        Some(reason)
    }
}

/// Format a duration as `H:MM:SS`, prefixed with days when needed
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    let clock = format!("{}:{:02}:{:02}", hours, minutes, seconds);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        _ => format!("{} days, {}", days, clock),
    }
}

/// Announcement sent after restricting a user
pub fn restriction_message(name: &str, duration: Duration, reason: Option<&str>) -> String {
    let mut message = format!("{} has been restricted for {}.", name, format_duration(duration));
    if let Some(reason) = reason {
        message.push_str(&format!("\nReason: {}", reason));
    }
    message
}

/// Announcement sent after a successful kick
pub fn kick_message(name: &str, reason: Option<&str>) -> String {
    match reason {
        Some(reason) => format!("{} was kicked from chat due to {}.", name, reason),
        None => format!("{} was kicked from chat.", name),
    }
}

/// Group lines into messages that stay under `limit` characters
///
/// Lines are never split; a single line over the limit is sent on its own.
pub fn split_messages(lines: &[String], limit: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut current = String::new();

    for line in lines {
        let line_length = line.chars().count();
        let current_length = current.chars().count();

        if !current.is_empty() && current_length + 1 + line_length >= limit {
            messages.push(std::mem::take(&mut current));
        }

        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }

    if !current.is_empty() {
        messages.push(current);
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mute_args() {
        assert_eq!(parse_mute_args("", 15), None);

        let args = parse_mute_args("@bob", 15).unwrap();
        assert_eq!(args.username, "@bob");
        assert_eq!(args.duration, Duration::from_secs(15 * 60));
        assert_eq!(args.reason, None);

        let args = parse_mute_args("@bob 5 spamming the chat", 15).unwrap();
        assert_eq!(args.duration, Duration::from_secs(5 * 60));
        assert_eq!(args.reason.as_deref(), Some("spamming the chat"));

        let args = parse_mute_args("@bob soon spam", 15).unwrap();
        assert_eq!(args.duration, Duration::from_secs(15 * 60));
        assert_eq!(args.reason.as_deref(), Some("spam"));
    }

    #[test]
    fn test_parse_kick_args() {
        assert_eq!(parse_kick_args("   "), None);
        let args = parse_kick_args("@eve being rude").unwrap();
        assert_eq!(args.username, "@eve");
        assert_eq!(args.reason.as_deref(), Some("being rude"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(15 * 60)), "0:15:00");
        assert_eq!(format_duration(Duration::from_secs(3_661)), "1:01:01");
        assert_eq!(format_duration(Duration::from_secs(86_400 + 60)), "1 day, 0:01:00");
        assert_eq!(format_duration(Duration::from_secs(2 * 86_400)), "2 days, 0:00:00");
    }

    #[test]
    fn test_restriction_and_kick_messages() {
        assert_eq!(
            restriction_message("@bob", Duration::from_secs(900), None),
            "@bob has been restricted for 0:15:00."
        );
        assert_eq!(
            restriction_message("@bob", Duration::from_secs(900), Some("spam")),
            "@bob has been restricted for 0:15:00.\nReason: spam"
        );
        assert_eq!(kick_message("@eve", None), "@eve was kicked from chat.");
        assert_eq!(
            kick_message("@eve", Some("spam")),
            "@eve was kicked from chat due to spam."
        );
    }

    #[test]
    fn test_usage_texts_are_plain() {
        for usage in [MUTE_USAGE, UNMUTE_USAGE, KICK_USAGE] {
            assert!(!usage.contains('`'), "{usage}");
            assert!(!usage.contains('*'), "{usage}");
        }
        assert!(MUTE_USAGE.contains("/mute <user> [<timeout in minutes>] [<reason>]"));
        assert!(KICK_USAGE.contains("/kick <user> [<reason>]"));
    }

    #[test]
    fn test_user_not_found_message() {
        assert_eq!(
            user_not_found_message("mute", "@ghost"),
            "Can't mute @ghost (not found in current chat)."
        );
    }

    #[test]
    fn test_split_messages_respects_limit() {
        let lines: Vec<String> = (0..10).map(|i| format!("user{}", i)).collect();
        let messages = split_messages(&lines, 20);

        assert!(messages.iter().all(|m| m.chars().count() < 20));
        let rejoined: Vec<String> = messages
            .iter()
            .flat_map(|m| m.lines().map(str::to_string))
            .collect();
        assert_eq!(rejoined, lines);
    }

    #[test]
    fn test_split_messages_small_input() {
        let lines = vec!["a".to_string(), "b".to_string()];
        assert_eq!(split_messages(&lines, MESSAGE_LENGTH_LIMIT), vec!["a\nb"]);
        assert!(split_messages(&[], MESSAGE_LENGTH_LIMIT).is_empty());
    }
}
