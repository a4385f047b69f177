use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{
    domain::{ChatId, UserId},
    errors::Error,
    store::ListEntry,
    Result,
};

const AUDIT_MAX_TEXT: usize = 500;

/// RFC3339 timestamp in UTC.
pub fn iso_timestamp_utc() -> String {
    Utc::now().to_rfc3339()
}

/// Who triggered a list mutation.
#[derive(Clone, Debug)]
pub struct Actor {
    pub user_id: UserId,
    pub username: Option<String>,
}

/// One list mutation, as written to the audit trail.
#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,
    pub chat_id: i64,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl AuditEvent {
    fn base(event: &str, chat_id: ChatId, actor: &Actor) -> Self {
        Self {
            timestamp: iso_timestamp_utc(),
            event: event.to_string(),
            chat_id: chat_id.0,
            user_id: actor.user_id.0,
            username: actor.username.clone(),
            item: None,
            person: None,
            comment: None,
            position: None,
        }
    }

    pub fn added(chat_id: ChatId, actor: &Actor, entry: &ListEntry) -> Self {
        Self {
            item: Some(entry.item.clone()),
            person: Some(entry.person.clone()),
            comment: Some(entry.comment.clone()),
            ..Self::base("add", chat_id, actor)
        }
    }

    /// `index` is the 0-based store position; the trail records it 1-based as
    /// shown to users.
    pub fn removed(chat_id: ChatId, actor: &Actor, index: usize, entry: &ListEntry) -> Self {
        Self {
            item: Some(entry.item.clone()),
            person: Some(entry.person.clone()),
            position: Some(index + 1),
            ..Self::base("remove", chat_id, actor)
        }
    }

    pub fn cleared(chat_id: ChatId, actor: &Actor) -> Self {
        Self::base("clear", chat_id, actor)
    }
}

#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        for field in [&mut event.item, &mut event.person, &mut event.comment] {
            if let Some(s) = field.as_deref() {
                *field = Some(truncate_text(s, AUDIT_MAX_TEXT));
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        // Plain text format for readability.
        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        let fields = obj
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s:?}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(file, "{fields}")?;
        Ok(())
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = std::process::id();
        std::env::temp_dir().join(format!("{prefix}-{pid}-{ts}.log"))
    }

    fn actor() -> Actor {
        Actor {
            user_id: UserId(42),
            username: Some("alice".to_string()),
        }
    }

    fn entry(item: &str) -> ListEntry {
        ListEntry {
            item: item.to_string(),
            person: "Alice".to_string(),
            comment: "-".to_string(),
        }
    }

    #[test]
    fn json_lines_are_appended() {
        let log = AuditLogger::new(tmp_file("listbot-audit-json"), true);
        log.write(AuditEvent::added(ChatId(1), &actor(), &entry("Milk")))
            .unwrap();
        log.write(AuditEvent::removed(ChatId(1), &actor(), 0, &entry("Milk")))
            .unwrap();
        log.write(AuditEvent::cleared(ChatId(1), &actor())).unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event"], "add");
        assert_eq!(lines[0]["item"], "Milk");
        assert_eq!(lines[1]["event"], "remove");
        assert_eq!(lines[1]["position"], 1);
        assert_eq!(lines[2]["event"], "clear");
        assert!(lines[2].get("item").is_none());

        let _ = std::fs::remove_file(log.path());
    }

    #[test]
    fn long_fields_are_truncated() {
        let log = AuditLogger::new(tmp_file("listbot-audit-trunc"), false);
        let long = "x".repeat(AUDIT_MAX_TEXT + 10);
        log.write(AuditEvent::added(ChatId(1), &actor(), &entry(&long)))
            .unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        assert!(written.contains("event=\"add\""));
        assert!(written.contains("..."));
        assert!(!written.contains(&long));

        let _ = std::fs::remove_file(log.path());
    }
}
