use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{InlineKeyboard, MessagingCapabilities},
    Result,
};

/// Outbound half of the messaging gateway.
///
/// Telegram is the first implementation; texts are plain (no markup) so user
/// supplied item names never need escaping.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef>;

    async fn send_text_with_options(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef>;

    /// Replace the text of a message sent earlier (drops its buttons).
    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()>;

    /// Acknowledge a button press so the client stops its loading indicator.
    async fn answer_selection(&self, selection_id: &str) -> Result<()>;
}
