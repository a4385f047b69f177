use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{domain::ChatId, errors::Error, Result};

/// Comment stored when the user answers `none`.
pub const NO_COMMENT: &str = "-";

/// One record on a chat's list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListEntry {
    pub item: String,
    pub person: String,
    pub comment: String,
}

impl ListEntry {
    /// Build an entry from raw dialog answers. A case-insensitive `none`
    /// comment becomes [`NO_COMMENT`]; everything else is kept verbatim.
    pub fn new(item: String, person: String, comment: String) -> Self {
        let comment = if comment.to_lowercase() == "none" {
            NO_COMMENT.to_string()
        } else {
            comment
        };
        Self {
            item,
            person,
            comment,
        }
    }
}

/// In-memory lists keyed by chat.
///
/// A missing key and an empty list are indistinguishable to callers. Entries
/// are only appended, removed by position, or dropped wholesale; nothing is
/// edited in place. Callers that need read-then-write consistency for a chat
/// serialize through [`crate::dispatcher::ChatLocks`].
#[derive(Debug, Default)]
pub struct ListStore {
    lists: Mutex<HashMap<ChatId, Vec<ListEntry>>>,
}

impl ListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_entry(&self, chat_id: ChatId, entry: ListEntry) {
        let mut lists = self.lists.lock().await;
        lists.entry(chat_id).or_default().push(entry);
    }

    pub async fn list_entries(&self, chat_id: ChatId) -> Vec<ListEntry> {
        self.lists
            .lock()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) async fn count(&self, chat_id: ChatId) -> usize {
        self.lists.lock().await.get(&chat_id).map_or(0, Vec::len)
    }

    /// Remove the entry at `index` (0-based), shifting later entries left.
    pub async fn remove_at(&self, chat_id: ChatId, index: usize) -> Result<ListEntry> {
        let mut lists = self.lists.lock().await;
        let len = lists.get(&chat_id).map_or(0, Vec::len);
        match lists.get_mut(&chat_id) {
            Some(entries) if index < entries.len() => Ok(entries.remove(index)),
            _ => Err(Error::NotFound { index, len }),
        }
    }

    pub async fn clear_all(&self, chat_id: ChatId) {
        let mut lists = self.lists.lock().await;
        lists.insert(chat_id, Vec::new());
    }
}
