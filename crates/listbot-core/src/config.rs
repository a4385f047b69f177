use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration for the list bot.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_token: String,

    // Telegram limits
    pub telegram_message_limit: usize,
    pub telegram_safe_limit: usize,
    pub button_label_max_length: usize,

    // Audit
    pub audit_log_path: Option<PathBuf>,
    pub audit_log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            telegram_message_limit: 4096,
            telegram_safe_limit: 4000,
            button_label_max_length: 40,
            audit_log_path: None,
            audit_log_json: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_token = env_str("TELEGRAM_TOKEN")
            .and_then(non_empty)
            .or_else(|| env_str("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("No TELEGRAM_TOKEN found in environment variables".to_string())
            })?;

        let defaults = Self::default();

        let telegram_message_limit =
            env_usize("TELEGRAM_MESSAGE_LIMIT").unwrap_or(defaults.telegram_message_limit);
        // The safe limit never exceeds the hard one.
        let telegram_safe_limit = env_usize("TELEGRAM_SAFE_LIMIT")
            .unwrap_or(defaults.telegram_safe_limit)
            .min(telegram_message_limit);
        let button_label_max_length = env_usize("BUTTON_LABEL_MAX_LENGTH")
            .unwrap_or(defaults.button_label_max_length)
            .max(1);

        let audit_log_path = env_str("AUDIT_LOG_PATH")
            .and_then(non_empty)
            .map(PathBuf::from);
        let audit_log_json = env_bool("AUDIT_LOG_JSON").unwrap_or(false);

        Ok(Self {
            telegram_token,
            telegram_message_limit,
            telegram_safe_limit,
            button_label_max_length,
            audit_log_path,
            audit_log_json,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| parse_bool(&s))
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
