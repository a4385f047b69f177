use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};

use listbot_core::{
    config::Config, dispatcher::Dispatcher as ListDispatcher, messaging::port::MessagingPort,
    store::ListStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<ListDispatcher>,
}

/// Commands advertised in the Telegram client menu.
pub fn bot_commands() -> Vec<BotCommand> {
    [
        ("start", "Start the bot"),
        ("help", "Show available commands"),
        ("list", "View the current list"),
        ("add", "Add a new item to the list"),
        ("remove", "Remove an item from the list"),
        ("clear", "Clear the entire list"),
        ("cancel", "Cancel the current operation"),
    ]
    .into_iter()
    .map(|(cmd, desc)| BotCommand::new(cmd, desc))
    .collect()
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_token.clone());

    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "list bot started"),
        Err(e) => tracing::warn!(error = %e, "get_me failed; continuing"),
    }

    // Best-effort: a failure only loses the client-side command menu.
    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        tracing::warn!(error = %e, "failed to register bot commands");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(
        TelegramMessenger::new(bot.clone()).with_max_message_len(cfg.telegram_message_limit),
    );
    let store = Arc::new(ListStore::new());

    let state = Arc::new(AppState {
        dispatcher: Arc::new(ListDispatcher::new(&cfg, store, messenger)),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    tracing::info!("list bot stopped");
    Ok(())
}
