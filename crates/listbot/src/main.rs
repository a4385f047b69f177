use std::sync::Arc;

use listbot_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), listbot_core::Error> {
    listbot_core::logging::init("listbot")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        audit = cfg.audit_log_path.is_some(),
        message_limit = cfg.telegram_message_limit,
        "configuration loaded"
    );

    listbot_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| listbot_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
