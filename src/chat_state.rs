//! # Chat State Module
//!
//! In-memory bookkeeping of the chats the bot is in and the members it has
//! seen, including their mute status. The whole state is persisted as JSON
//! so membership survives restarts.
//!
//! File format:
//!
//! ```json
//! { "chats": [ { "id": -100123, "title": "Kitchen", "users": [ { "id": 42, "name": "@alice", "muted": false } ] } ] }
//! ```
//!
//! Muted users also carry `"muted_until"` (RFC 3339). Mutes that have ended,
//! or whose end is unknown, are cleared when the file is loaded.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::observability;

/// A chat member known to the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: u64,
    /// `@username` when the user has one, otherwise the full name
    pub name: String,
    #[serde(default)]
    pub muted: bool,
    /// When the current restriction ends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted_until: Option<DateTime<Utc>>,
}

impl ChatUser {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            muted: false,
            muted_until: None,
        }
    }

    /// Whether the mute flag has outlived its restriction
    ///
    /// A mute without a known end cannot be tracked after a restart.
    pub fn mute_expired(&self, now: DateTime<Utc>) -> bool {
        self.muted && self.muted_until.map_or(true, |until| until <= now)
    }

    fn clear_mute(&mut self) {
        self.muted = false;
        self.muted_until = None;
    }
}

/// A chat and its known members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: i64,
    pub title: Option<String>,
    #[serde(default)]
    pub users: Vec<ChatUser>,
}

impl ChatRecord {
    pub fn new(id: i64, title: Option<String>) -> Self {
        Self {
            id,
            title,
            users: Vec::new(),
        }
    }

    /// Short human readable description used by `/status`
    pub fn summary(&self) -> String {
        let muted = self.users.iter().filter(|user| user.muted).count();
        format!(
            "Chat {} ({}): {} known users, {} muted",
            self.title.as_deref().unwrap_or("<private>"),
            self.id,
            self.users.len(),
            muted
        )
    }
}

/// Serialized form of the whole state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatStateSnapshot {
    #[serde(default)]
    pub chats: Vec<ChatRecord>,
}

/// Thread-safe registry of chats, optionally backed by a JSON file
#[derive(Debug)]
pub struct ChatRegistry {
    chats: Mutex<BTreeMap<i64, ChatRecord>>,
    path: Option<PathBuf>,
}

impl ChatRegistry {
    /// Registry without a backing file
    pub fn in_memory() -> Self {
        Self {
            chats: Mutex::new(BTreeMap::new()),
            path: None,
        }
    }

    /// Load the registry from `path`; a missing file gives an empty state
    pub fn load(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref().to_path_buf();

        let snapshot = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => ChatStateSnapshot::default(),
            Ok(content) => serde_json::from_str::<ChatStateSnapshot>(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No state file found, starting with empty state");
                ChatStateSnapshot::default()
            }
            Err(e) => return Err(e.into()),
        };

        let mut chats: BTreeMap<i64, ChatRecord> = snapshot
            .chats
            .into_iter()
            .map(|chat| (chat.id, chat))
            .collect();

        let expired = expire_mutes(&mut chats, Utc::now());

        info!(
            path = %path.display(),
            chat_count = chats.len(),
            expired_mutes = expired,
            "Chat state loaded"
        );
        observability::record_tracked_chats(chats.len());

        Ok(Self {
            chats: Mutex::new(chats),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ChatStateSnapshot {
        ChatStateSnapshot {
            chats: self.chats.lock().values().cloned().collect(),
        }
    }

    /// Write the state to the backing file, if any
    ///
    /// The file is replaced atomically through a sibling temporary file.
    pub fn save(&self) -> AppResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let start = Instant::now();
        let result = write_snapshot(path, &self.snapshot());
        observability::record_state_save(result.is_ok(), start.elapsed());

        if result.is_ok() {
            debug!(path = %path.display(), "Chat state saved");
        }
        result
    }

    /// Make sure a chat exists, updating its title when one is given
    pub fn ensure_chat(&self, chat_id: i64, title: Option<&str>) {
        let mut chats = self.chats.lock();
        let chat = chats
            .entry(chat_id)
            .or_insert_with(|| ChatRecord::new(chat_id, None));
        if let Some(title) = title {
            chat.title = Some(title.to_string());
        }
        observability::record_tracked_chats(chats.len());
    }

    /// Add a user to a chat, or refresh their name
    ///
    /// Returns `true` when the state changed.
    pub fn register_user(&self, chat_id: i64, title: Option<&str>, user: ChatUser) -> bool {
        self.ensure_chat(chat_id, title);

        let mut chats = self.chats.lock();
        let Some(chat) = chats.get_mut(&chat_id) else {
            return false;
        };

        match chat.users.iter_mut().find(|known| known.id == user.id) {
            Some(known) if known.name == user.name => false,
            Some(known) => {
                known.name = user.name;
                true
            }
            None => {
                debug!(chat_id = %chat_id, user_id = %user.id, "Registering new chat user");
                chat.users.push(user);
                true
            }
        }
    }

    pub fn remove_user(&self, chat_id: i64, user_id: u64) -> Option<ChatUser> {
        let mut chats = self.chats.lock();
        let chat = chats.get_mut(&chat_id)?;
        let index = chat.users.iter().position(|user| user.id == user_id)?;
        Some(chat.users.remove(index))
    }

    pub fn remove_chat(&self, chat_id: i64) -> Option<ChatRecord> {
        let mut chats = self.chats.lock();
        let removed = chats.remove(&chat_id);
        observability::record_tracked_chats(chats.len());
        removed
    }

    /// Move a chat to a new id (group upgraded to supergroup)
    pub fn migrate_chat(&self, from_id: i64, to_id: i64) -> bool {
        let mut chats = self.chats.lock();
        let Some(mut chat) = chats.remove(&from_id) else {
            warn!(from_id = %from_id, to_id = %to_id, "Cannot migrate unknown chat");
            return false;
        };
        chat.id = to_id;
        chats.insert(to_id, chat);
        true
    }

    pub fn chat(&self, chat_id: i64) -> Option<ChatRecord> {
        self.chats.lock().get(&chat_id).cloned()
    }

    /// Id of the first chat with exactly this title
    pub fn find_chat_by_title(&self, title: &str) -> Option<i64> {
        self.chats
            .lock()
            .values()
            .find(|chat| chat.title.as_deref() == Some(title))
            .map(|chat| chat.id)
    }

    /// Look up a member by name, optionally ignoring case
    pub fn find_user_by_name(
        &self,
        chat_id: i64,
        name: &str,
        ignore_case: bool,
    ) -> Option<ChatUser> {
        let chats = self.chats.lock();
        chats.get(&chat_id)?.users.iter().find(|user| {
            if ignore_case {
                user.name.to_lowercase() == name.to_lowercase()
            } else {
                user.name == name
            }
        })
        .cloned()
    }

    /// Members of a chat sorted by name
    pub fn users_sorted(&self, chat_id: i64) -> Vec<ChatUser> {
        let mut users = self
            .chats
            .lock()
            .get(&chat_id)
            .map(|chat| chat.users.clone())
            .unwrap_or_default();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        users
    }

    fn with_user<R>(
        &self,
        chat_id: i64,
        user_id: u64,
        update: impl FnOnce(&mut ChatUser) -> R,
    ) -> Option<R> {
        let mut chats = self.chats.lock();
        chats
            .get_mut(&chat_id)
            .and_then(|chat| chat.users.iter_mut().find(|user| user.id == user_id))
            .map(update)
    }

    /// Update the mute flag without an end time; returns `false` for unknown users
    pub fn set_muted(&self, chat_id: i64, user_id: u64, muted: bool) -> bool {
        self.with_user(chat_id, user_id, |user| {
            user.muted = muted;
            user.muted_until = None;
        })
        .is_some()
    }

    /// Mark a user as muted until `until`; returns `false` for unknown users
    pub fn mute_until(&self, chat_id: i64, user_id: u64, until: DateTime<Utc>) -> bool {
        self.with_user(chat_id, user_id, |user| {
            user.muted = true;
            user.muted_until = Some(until);
        })
        .is_some()
    }

    /// Clear the mute flag if its restriction has ended by `now`
    ///
    /// Returns `true` when the flag was cleared. A later mute of the same
    /// user is left alone.
    pub fn expire_mute(&self, chat_id: i64, user_id: u64, now: DateTime<Utc>) -> bool {
        self.with_user(chat_id, user_id, |user| {
            let expired = user.mute_expired(now);
            if expired {
                user.clear_mute();
            }
            expired
        })
        .unwrap_or(false)
    }

    /// Muted users whose restriction is still running, with its end time
    pub fn pending_unmutes(&self) -> Vec<(i64, u64, DateTime<Utc>)> {
        self.chats
            .lock()
            .values()
            .flat_map(|chat| {
                chat.users.iter().filter_map(move |user| match user.muted_until {
                    Some(until) if user.muted => Some((chat.id, user.id, until)),
                    _ => None,
                })
            })
            .collect()
    }

    /// Pretty-printed JSON of one chat, as sent by `/get_data`
    pub fn chat_json(&self, chat_id: i64) -> AppResult<Option<String>> {
        match self.chat(chat_id) {
            Some(chat) => Ok(Some(serde_json::to_string_pretty(&chat)?)),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.chats.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.lock().is_empty()
    }
}

fn expire_mutes(chats: &mut BTreeMap<i64, ChatRecord>, now: DateTime<Utc>) -> usize {
    let mut expired = 0;
    for user in chats.values_mut().flat_map(|chat| chat.users.iter_mut()) {
        if user.mute_expired(now) {
            user.clear_mute();
            expired += 1;
        }
    }
    expired
}

fn write_snapshot(path: &Path, snapshot: &ChatStateSnapshot) -> AppResult<()> {
    let content = serde_json::to_string_pretty(snapshot)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| AppError::State(format!("invalid state path {}", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_users() -> ChatRegistry {
        let registry = ChatRegistry::in_memory();
        registry.register_user(-100, Some("Kitchen"), ChatUser::new(2, "@bob"));
        registry.register_user(-100, Some("Kitchen"), ChatUser::new(1, "@Alice"));
        registry
    }

    #[test]
    fn test_register_user_is_idempotent() {
        let registry = registry_with_users();
        assert!(!registry.register_user(-100, None, ChatUser::new(2, "@bob")));
        assert!(registry.register_user(-100, None, ChatUser::new(2, "@bobby")));
        assert_eq!(registry.chat(-100).unwrap().users.len(), 2);
        // Title kept when none is given
        assert_eq!(registry.chat(-100).unwrap().title.as_deref(), Some("Kitchen"));
    }

    #[test]
    fn test_users_sorted_by_name() {
        let registry = registry_with_users();
        let names: Vec<String> = registry
            .users_sorted(-100)
            .into_iter()
            .map(|user| user.name)
            .collect();
        assert_eq!(names, vec!["@Alice", "@bob"]);
        assert!(registry.users_sorted(-1).is_empty());
    }

    #[test]
    fn test_find_user_by_name() {
        let registry = registry_with_users();
        assert!(registry.find_user_by_name(-100, "@alice", false).is_none());
        assert_eq!(
            registry.find_user_by_name(-100, "@alice", true).unwrap().id,
            1
        );
    }

    #[test]
    fn test_mute_flag_and_removal() {
        let registry = registry_with_users();
        assert!(registry.set_muted(-100, 2, true));
        assert!(registry.chat(-100).unwrap().users.iter().any(|u| u.id == 2 && u.muted));
        assert!(!registry.set_muted(-100, 99, true));

        assert_eq!(registry.remove_user(-100, 2).unwrap().name, "@bob");
        assert!(registry.remove_user(-100, 2).is_none());
        assert!(registry.remove_chat(-100).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_migrate_chat_and_find_by_title() {
        let registry = registry_with_users();
        assert!(registry.migrate_chat(-100, -100200));
        assert!(registry.chat(-100).is_none());
        assert_eq!(registry.find_chat_by_title("Kitchen"), Some(-100200));
        assert!(!registry.migrate_chat(-5, -6));
    }

    #[test]
    fn test_expire_mute_respects_end_time() {
        let registry = registry_with_users();
        let now = Utc::now();
        assert!(registry.mute_until(-100, 2, now + chrono::TimeDelta::minutes(5)));

        assert!(!registry.expire_mute(-100, 2, now));
        assert_eq!(registry.pending_unmutes().len(), 1);

        assert!(registry.expire_mute(-100, 2, now + chrono::TimeDelta::minutes(5)));
        let bob = registry.find_user_by_name(-100, "@bob", false).unwrap();
        assert!(!bob.muted);
        assert!(bob.muted_until.is_none());
        assert!(registry.pending_unmutes().is_empty());
        assert!(!registry.expire_mute(-100, 99, now));
    }

    #[test]
    fn test_summary() {
        let registry = registry_with_users();
        registry.set_muted(-100, 1, true);
        assert_eq!(
            registry.chat(-100).unwrap().summary(),
            "Chat Kitchen (-100): 2 known users, 1 muted"
        );
    }
}
