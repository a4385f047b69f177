/// Core error type for the list bot.
///
/// Adapter crates should map their specific errors into this type so the
/// dispatcher can handle failures consistently (user-facing message vs log).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("item not found: index {index} (list has {len} entries)")]
    NotFound { index: usize, len: usize },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
