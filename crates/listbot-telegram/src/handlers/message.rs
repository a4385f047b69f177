use std::sync::Arc;

use teloxide::prelude::*;

use listbot_core::{
    dialog::split_command,
    domain::{ChatId, UserId},
    messaging::types::{Command, IncomingUpdate, TextMessage},
};

use crate::router::AppState;

/// Classify raw message text. Slash-prefixed text becomes a command (the
/// core treats unknown names as plain text); everything else is free text.
pub(crate) fn classify_text(
    chat_id: ChatId,
    user_id: UserId,
    username: Option<String>,
    text: &str,
) -> IncomingUpdate {
    match split_command(text) {
        Some((name, args)) if !name.is_empty() => IncomingUpdate::Command(Command {
            chat_id,
            user_id,
            username,
            name,
            args,
        }),
        _ => IncomingUpdate::Text(TextMessage {
            chat_id,
            user_id,
            username,
            text: text.to_string(),
        }),
    }
}

pub async fn handle_message(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Edited messages arrive as a separate update kind and never reach here;
    // non-text messages (stickers, photos...) are not list input.
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = ChatId(msg.chat.id.0);
    let (user_id, username) = match msg.from() {
        Some(u) => (UserId(u.id.0 as i64), u.username.clone()),
        None => (UserId(0), None),
    };

    let update = classify_text(chat_id, user_id, username, text);
    if let Err(e) = state.dispatcher.handle(update).await {
        tracing::warn!(chat_id = %chat_id, error = %e, "failed to handle message");
    }
    Ok(())
}
