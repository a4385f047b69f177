use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{ChatId, UserId};

/// Which dialog a chat is in, with the answers collected so far.
///
/// Partial answers only exist inside their variant, so replacing the state
/// (new dialog, cancel, completion) drops them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    AwaitingItem,
    AwaitingPerson {
        item: String,
    },
    AwaitingComment {
        item: String,
        person: String,
    },
    AwaitingRemovalSelection,
    AwaitingClearConfirmation,
}

impl SessionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short label for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingItem => "awaiting_item",
            Self::AwaitingPerson { .. } => "awaiting_person",
            Self::AwaitingComment { .. } => "awaiting_comment",
            Self::AwaitingRemovalSelection => "awaiting_removal_selection",
            Self::AwaitingClearConfirmation => "awaiting_clear_confirmation",
        }
    }
}

/// One user's dialog within one chat. Group members each run their own
/// dialogs against the shared chat list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl SessionKey {
    pub fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }
}

/// Session state per (chat, user). Idle sessions hold no entry.
#[derive(Debug, Default)]
pub struct SessionStore {
    states: Mutex<HashMap<SessionKey, SessionState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: SessionKey) -> SessionState {
        self.states
            .lock()
            .await
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    /// Overwrite the session's state. Setting `Idle` forgets the session.
    pub async fn set(&self, key: SessionKey, state: SessionState) {
        let mut states = self.states.lock().await;
        if state.is_idle() {
            states.remove(&key);
        } else {
            states.insert(key, state);
        }
    }

    #[cfg(test)]
    pub(crate) async fn active_count(&self) -> usize {
        self.states.lock().await.len()
    }
}
