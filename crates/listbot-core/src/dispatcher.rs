use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    audit::{Actor, AuditEvent, AuditLogger},
    config::Config,
    dialog::{self, DialogContext, Effect, Event, Mutation, Reply, SelectionTag},
    domain::{ChatId, MessageRef},
    formatting,
    messaging::{port::MessagingPort, types::IncomingUpdate},
    session::{SessionKey, SessionStore},
    store::ListStore,
    Result,
};

/// One async mutex per chat. Work for a chat runs under its guard, so
/// transitions for the same chat never interleave while different chats
/// proceed in parallel.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Routes classified updates through the dialog state machine and applies
/// the resulting effects.
///
/// Dialogs are tracked per user within a chat; the list and the lock that
/// serializes work on it are per chat.
pub struct Dispatcher {
    store: Arc<ListStore>,
    sessions: SessionStore,
    chat_locks: ChatLocks,
    messenger: Arc<dyn MessagingPort>,
    audit: Option<AuditLogger>,
    message_limit: usize,
    label_max_len: usize,
}

/// Where an update came from, for audit lines and button edits.
struct Origin {
    chat_id: ChatId,
    actor: Actor,
    selected: Option<MessageRef>,
}

impl Dispatcher {
    pub fn new(cfg: &Config, store: Arc<ListStore>, messenger: Arc<dyn MessagingPort>) -> Self {
        let message_limit = cfg
            .telegram_safe_limit
            .min(messenger.capabilities().max_message_len)
            .max(200);
        Self {
            store,
            sessions: SessionStore::new(),
            chat_locks: ChatLocks::default(),
            messenger,
            audit: cfg
                .audit_log_path
                .as_ref()
                .map(|p| AuditLogger::new(p.clone(), cfg.audit_log_json)),
            message_limit,
            label_max_len: cfg.button_label_max_length,
        }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &Arc<ListStore> {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handle one inbound update end to end.
    ///
    /// Errors are gateway failures only; user-facing failures (stale
    /// selections, empty lists) are replies, not errors. Every reply is
    /// attempted; the first failed send is returned after the rest go out.
    pub async fn handle(&self, update: IncomingUpdate) -> Result<()> {
        let (origin, event) = match update {
            IncomingUpdate::Command(cmd) => {
                let origin = Origin {
                    chat_id: cmd.chat_id,
                    actor: Actor {
                        user_id: cmd.user_id,
                        username: cmd.username,
                    },
                    selected: None,
                };
                match dialog::CommandKind::from_name(&cmd.name) {
                    Some(kind) => (origin, Event::Command(kind)),
                    None => {
                        // Unknown commands are ordinary text (an add-dialog
                        // answer may start with '/').
                        let text = if cmd.args.is_empty() {
                            format!("/{}", cmd.name)
                        } else {
                            format!("/{} {}", cmd.name, cmd.args)
                        };
                        (origin, Event::Text(text))
                    }
                }
            }
            IncomingUpdate::Text(msg) => (
                Origin {
                    chat_id: msg.chat_id,
                    actor: Actor {
                        user_id: msg.user_id,
                        username: msg.username,
                    },
                    selected: None,
                },
                Event::Text(msg.text),
            ),
            IncomingUpdate::Selection(sel) => {
                // Always answer so the client stops its spinner.
                if let Err(e) = self.messenger.answer_selection(&sel.selection_id).await {
                    tracing::warn!(chat_id = %sel.chat_id, error = %e, "failed to answer selection");
                }
                let Some(tag) = SelectionTag::parse(&sel.tag) else {
                    tracing::debug!(chat_id = %sel.chat_id, tag = %sel.tag, "ignoring unknown selection tag");
                    return Ok(());
                };
                (
                    Origin {
                        chat_id: sel.chat_id,
                        actor: Actor {
                            user_id: sel.user_id,
                            username: sel.username,
                        },
                        selected: sel.message,
                    },
                    Event::Selection(tag),
                )
            }
        };

        self.dispatch(origin, event).await
    }

    async fn dispatch(&self, origin: Origin, event: Event) -> Result<()> {
        let chat_id = origin.chat_id;
        let key = SessionKey::new(chat_id, origin.actor.user_id);
        let _guard = self.chat_locks.lock_chat(chat_id.0).await;

        let state = self.sessions.get(key).await;
        let entries = self.store.list_entries(chat_id).await;
        let ctx = DialogContext {
            entries: &entries,
            message_limit: self.message_limit,
            label_max_len: self.label_max_len,
        };

        tracing::debug!(
            chat_id = %chat_id,
            user_id = key.user_id.0,
            state = state.name(),
            event = ?event,
            "dispatching"
        );
        let result = dialog::transition(&state, &ctx, event);

        let mut replies: Vec<Reply> = Vec::new();
        let mut replacement: Option<Reply> = None;
        for effect in result.effects {
            match effect {
                Effect::Mutate(m) => replacement = self.apply(&origin, m).await,
                Effect::Reply(r) => replies.push(r),
            }
        }
        if let Some(reply) = replacement {
            replies = vec![reply];
        }

        if result.new_state != state {
            tracing::debug!(
                chat_id = %chat_id,
                user_id = key.user_id.0,
                from = state.name(),
                to = result.new_state.name(),
                "session transition"
            );
        }
        self.sessions.set(key, result.new_state).await;

        let mut first_err = None;
        for reply in replies {
            if let Err(e) = self.send(&origin, reply).await {
                tracing::warn!(chat_id = %chat_id, error = %e, "failed to deliver reply");
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Apply a store mutation. Returns a replacement reply when the store
    /// disagrees with the snapshot the transition saw.
    async fn apply(&self, origin: &Origin, mutation: Mutation) -> Option<Reply> {
        let chat_id = origin.chat_id;
        match mutation {
            Mutation::Add(entry) => {
                tracing::info!(chat_id = %chat_id, item = %entry.item, person = %entry.person, "entry added");
                self.audit(AuditEvent::added(chat_id, &origin.actor, &entry));
                self.store.add_entry(chat_id, entry).await;
                None
            }
            Mutation::RemoveAt(index) => match self.store.remove_at(chat_id, index).await {
                Ok(entry) => {
                    tracing::info!(chat_id = %chat_id, position = index + 1, item = %entry.item, "entry removed");
                    self.audit(AuditEvent::removed(chat_id, &origin.actor, index, &entry));
                    None
                }
                Err(e) => {
                    tracing::warn!(chat_id = %chat_id, error = %e, "removal target vanished");
                    Some(Reply::EditSelected(formatting::ITEM_NOT_FOUND.to_string()))
                }
            },
            Mutation::ClearAll => {
                tracing::info!(chat_id = %chat_id, "list cleared");
                self.audit(AuditEvent::cleared(chat_id, &origin.actor));
                self.store.clear_all(chat_id).await;
                None
            }
        }
    }

    fn audit(&self, event: AuditEvent) {
        let Some(audit) = &self.audit else {
            return;
        };
        if let Err(e) = audit.write(event) {
            tracing::warn!(path = %audit.path().display(), error = %e, "failed to write audit event");
        }
    }

    async fn send(&self, origin: &Origin, reply: Reply) -> Result<()> {
        let chat_id = origin.chat_id;
        match reply {
            Reply::Text(text) => {
                self.messenger.send_text(chat_id, &text).await?;
            }
            Reply::WithOptions { text, keyboard } => {
                self.messenger
                    .send_text_with_options(chat_id, &text, keyboard)
                    .await?;
            }
            Reply::EditSelected(text) => match origin.selected {
                Some(msg) if self.messenger.capabilities().supports_edit => {
                    self.messenger.edit_text(msg, &text).await?;
                }
                _ => {
                    self.messenger.send_text(chat_id, &text).await?;
                }
            },
        }
        Ok(())
    }
}
