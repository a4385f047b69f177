//! Telegram adapter (teloxide).
//!
//! This crate implements the `listbot-core` MessagingPort over the Telegram
//! Bot API and feeds classified updates into the core dispatcher.

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup},
};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use listbot_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities},
    },
    Result,
};

const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    max_message_len: usize,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self {
            bot,
            max_message_len: TELEGRAM_MAX_MESSAGE_LEN,
        }
    }

    pub fn with_max_message_len(mut self, max_message_len: usize) -> Self {
        self.max_message_len = max_message_len.min(TELEGRAM_MAX_MESSAGE_LEN);
        self
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        tracing::warn!(retry_after = ?d, "telegram flood control, retrying");
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

/// Telegram markup for a core keyboard, row layout preserved.
pub fn to_markup(keyboard: InlineKeyboard) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|b| InlineKeyboardButton::callback(b.label, b.tag))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_edit: true,
            max_message_len: self.max_message_len,
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string()))
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn send_text_with_options(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let markup = to_markup(keyboard);

        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .reply_markup(markup.clone())
            })
            .await?;

        Ok(MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        })
    }

    async fn edit_text(&self, msg: MessageRef, text: &str) -> Result<()> {
        self.with_retry(|| {
            self.bot.edit_message_text(
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
                text.to_string(),
            )
        })
        .await?;
        Ok(())
    }

    async fn answer_selection(&self, selection_id: &str) -> Result<()> {
        self.with_retry(|| self.bot.answer_callback_query(selection_id.to_string()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listbot_core::messaging::types::InlineButton;

    #[test]
    fn markup_keeps_rows_and_callback_data() {
        let keyboard = InlineKeyboard::new(vec![
            vec![InlineButton::new("1. Milk (Alice)", "remove_0")],
            vec![
                InlineButton::new("Yes, clear it", "clear_confirm"),
                InlineButton::new("No, keep it", "clear_cancel"),
            ],
        ]);

        let markup = to_markup(keyboard);
        assert_eq!(markup.inline_keyboard.len(), 2);
        assert_eq!(markup.inline_keyboard[1].len(), 2);
        assert_eq!(markup.inline_keyboard[0][0].text, "1. Milk (Alice)");
        assert_eq!(
            markup.inline_keyboard[1][0],
            InlineKeyboardButton::callback("Yes, clear it", "clear_confirm")
        );
    }

    #[test]
    fn message_limit_never_exceeds_telegram_max() {
        let m = TelegramMessenger::new(Bot::new("123:test")).with_max_message_len(10_000);
        assert_eq!(m.capabilities().max_message_len, TELEGRAM_MAX_MESSAGE_LEN);
        let m = TelegramMessenger::new(Bot::new("123:test")).with_max_message_len(1000);
        assert_eq!(m.capabilities().max_message_len, 1000);
    }
}
