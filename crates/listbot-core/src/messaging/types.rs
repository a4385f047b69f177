use crate::domain::{ChatId, MessageRef, UserId};

/// Inbound update, already classified by the adapter.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    Command(Command),
    Text(TextMessage),
    Selection(Selection),
}

#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub name: String,
    pub args: String,
}

#[derive(Clone, Debug)]
pub struct TextMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: String,
}

/// Button press on an inline keyboard.
#[derive(Clone, Debug)]
pub struct Selection {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub selection_id: String,
    pub tag: String,
    /// The keyboard message, when the platform still has it.
    pub message: Option<MessageRef>,
}

/// Inline keyboard (buttons) attached to an outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub tag: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            tag: tag.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    /// Convenience for "one button per row" layouts.
    pub fn one_per_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    /// Convenience for a single row of buttons (yes/no prompts).
    pub fn single_row(buttons: Vec<InlineButton>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub supports_edit: bool,
    pub max_message_len: usize,
}
