use std::sync::Arc;

use teloxide::prelude::*;

use listbot_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    messaging::types::{IncomingUpdate, Selection},
};

use crate::router::AppState;

/// Core selection for a button press. Inline-mode callbacks carry no chat
/// and yield `None`.
pub(crate) fn classify_query(q: &CallbackQuery) -> Option<IncomingUpdate> {
    let message = q.message.as_ref()?;
    let chat_id = ChatId(message.chat.id.0);
    Some(IncomingUpdate::Selection(Selection {
        chat_id,
        user_id: UserId(q.from.id.0 as i64),
        username: q.from.username.clone(),
        selection_id: q.id.clone(),
        tag: q.data.clone().unwrap_or_default(),
        message: Some(MessageRef {
            chat_id,
            message_id: MessageId(message.id.0),
        }),
    }))
}

pub async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let Some(update) = classify_query(&q) else {
        if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
            tracing::warn!(error = %e, "failed to answer selection");
        }
        return Ok(());
    };

    if let Err(e) = state.dispatcher.handle(update).await {
        tracing::warn!(error = %e, "failed to handle selection");
    }
    Ok(())
}
