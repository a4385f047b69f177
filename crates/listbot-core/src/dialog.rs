//! Conversation state machine.
//!
//! [`transition`] is pure: given the chat's session state, a snapshot of its
//! list and one event, it returns the next state plus the effects the
//! dispatcher must apply (outbound replies and at most one store mutation).

use crate::{
    errors::Error,
    formatting,
    messaging::types::{InlineButton, InlineKeyboard},
    session::SessionState,
    store::ListEntry,
    Result,
};

/// Commands the bot reacts to. Anything else starting with `/` is plain text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    Start,
    Help,
    List,
    Add,
    Remove,
    Clear,
    Cancel,
}

impl CommandKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "list" => Some(Self::List),
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "clear" => Some(Self::Clear),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

/// Split `/cmd@botname rest...` into a lowercase command name and the rest.
///
/// Returns `None` when the text is not slash-prefixed.
pub fn split_command(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }
    let mut parts = text.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    Some((cmd, rest))
}

/// Classify a message as a known command (with its argument text).
pub fn parse_command(text: &str) -> Option<(CommandKind, String)> {
    let (name, args) = split_command(text)?;
    CommandKind::from_name(&name).map(|kind| (kind, args))
}

const REMOVE_PREFIX: &str = "remove_";
const REMOVE_CANCEL_TAG: &str = "cancel";
const CLEAR_CONFIRM_TAG: &str = "clear_confirm";
const CLEAR_CANCEL_TAG: &str = "clear_cancel";

/// Callback data carried by inline buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionTag {
    /// 0-based list position captured when the keyboard was rendered.
    Remove(usize),
    RemoveCancel,
    ClearConfirm,
    ClearCancel,
}

impl SelectionTag {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            REMOVE_CANCEL_TAG => Some(Self::RemoveCancel),
            CLEAR_CONFIRM_TAG => Some(Self::ClearConfirm),
            CLEAR_CANCEL_TAG => Some(Self::ClearCancel),
            _ => tag
                .strip_prefix(REMOVE_PREFIX)
                .and_then(|idx| idx.parse::<usize>().ok())
                .map(Self::Remove),
        }
    }

    pub fn to_tag(self) -> String {
        match self {
            Self::Remove(idx) => format!("{REMOVE_PREFIX}{idx}"),
            Self::RemoveCancel => REMOVE_CANCEL_TAG.to_string(),
            Self::ClearConfirm => CLEAR_CONFIRM_TAG.to_string(),
            Self::ClearCancel => CLEAR_CANCEL_TAG.to_string(),
        }
    }
}

/// One inbound event, after the dispatcher has classified it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Command(CommandKind),
    Text(String),
    Selection(SelectionTag),
}

/// Outbound message produced by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    WithOptions {
        text: String,
        keyboard: InlineKeyboard,
    },
    /// Replace the text of the message whose button triggered the event.
    EditSelected(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Add(ListEntry),
    RemoveAt(usize),
    ClearAll,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Reply(Reply),
    Mutate(Mutation),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: SessionState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SessionState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_reply(Reply::Text(text.into()))
    }

    pub fn with_reply(mut self, reply: Reply) -> Self {
        self.effects.push(Effect::Reply(reply));
        self
    }

    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.effects.push(Effect::Mutate(mutation));
        self
    }

    pub fn replies(&self) -> impl Iterator<Item = &Reply> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Reply(r) => Some(r),
            Effect::Mutate(_) => None,
        })
    }

    pub fn mutation(&self) -> Option<&Mutation> {
        self.effects.iter().find_map(|e| match e {
            Effect::Mutate(m) => Some(m),
            Effect::Reply(_) => None,
        })
    }
}

/// Read-only inputs a transition may look at besides the session state.
#[derive(Clone, Copy, Debug)]
pub struct DialogContext<'a> {
    /// The chat's list as of this event.
    pub entries: &'a [ListEntry],
    /// Max bytes per outbound text.
    pub message_limit: usize,
    /// Max chars per button label.
    pub label_max_len: usize,
}

/// Resolve a removal position against a list snapshot.
pub fn resolve_removal(entries: &[ListEntry], index: usize) -> Result<&ListEntry> {
    entries.get(index).ok_or(Error::NotFound {
        index,
        len: entries.len(),
    })
}

pub fn transition(state: &SessionState, ctx: &DialogContext<'_>, event: Event) -> TransitionResult {
    match event {
        Event::Command(cmd) => on_command(state, ctx, cmd),
        Event::Text(text) => on_text(state, text),
        Event::Selection(tag) => on_selection(state, ctx, tag),
    }
}

fn on_command(state: &SessionState, ctx: &DialogContext<'_>, cmd: CommandKind) -> TransitionResult {
    match cmd {
        CommandKind::Start => TransitionResult::new(state.clone()).with_text(formatting::WELCOME),
        CommandKind::Help => TransitionResult::new(state.clone()).with_text(formatting::HELP),
        CommandKind::List => formatting::render_list(ctx.entries, ctx.message_limit)
            .into_iter()
            .fold(TransitionResult::new(state.clone()), |res, chunk| {
                res.with_text(chunk)
            }),

        CommandKind::Add => {
            TransitionResult::new(SessionState::AwaitingItem).with_text(formatting::ASK_ITEM)
        }

        CommandKind::Remove => {
            if ctx.entries.is_empty() {
                return TransitionResult::new(SessionState::Idle)
                    .with_text(formatting::NOTHING_TO_REMOVE);
            }
            let mut buttons: Vec<InlineButton> = ctx
                .entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    InlineButton::new(
                        formatting::removal_label(i + 1, entry, ctx.label_max_len),
                        SelectionTag::Remove(i).to_tag(),
                    )
                })
                .collect();
            buttons.push(InlineButton::new(
                formatting::CANCEL_LABEL,
                SelectionTag::RemoveCancel.to_tag(),
            ));
            TransitionResult::new(SessionState::AwaitingRemovalSelection).with_reply(
                Reply::WithOptions {
                    text: formatting::SELECT_TO_REMOVE.to_string(),
                    keyboard: InlineKeyboard::one_per_row(buttons),
                },
            )
        }

        CommandKind::Clear => TransitionResult::new(SessionState::AwaitingClearConfirmation)
            .with_reply(Reply::WithOptions {
                text: formatting::CONFIRM_CLEAR.to_string(),
                keyboard: InlineKeyboard::single_row(vec![
                    InlineButton::new(
                        formatting::CLEAR_YES_LABEL,
                        SelectionTag::ClearConfirm.to_tag(),
                    ),
                    InlineButton::new(
                        formatting::CLEAR_NO_LABEL,
                        SelectionTag::ClearCancel.to_tag(),
                    ),
                ]),
            }),

        // Only a running dialog has anything to cancel.
        CommandKind::Cancel if state.is_idle() => TransitionResult::new(SessionState::Idle),
        CommandKind::Cancel => {
            TransitionResult::new(SessionState::Idle).with_text(formatting::OPERATION_CANCELLED)
        }
    }
}

fn on_text(state: &SessionState, text: String) -> TransitionResult {
    match state {
        SessionState::AwaitingItem => {
            TransitionResult::new(SessionState::AwaitingPerson { item: text })
                .with_text(formatting::ASK_PERSON)
        }
        SessionState::AwaitingPerson { item } => TransitionResult::new(
            SessionState::AwaitingComment {
                item: item.clone(),
                person: text,
            },
        )
        .with_text(formatting::ASK_COMMENT),
        SessionState::AwaitingComment { item, person } => {
            let entry = ListEntry::new(item.clone(), person.clone(), text);
            let confirmation = formatting::added(&entry);
            TransitionResult::new(SessionState::Idle)
                .with_mutation(Mutation::Add(entry))
                .with_text(confirmation)
        }
        // Free text outside the add dialog is not addressed to the bot.
        SessionState::Idle
        | SessionState::AwaitingRemovalSelection
        | SessionState::AwaitingClearConfirmation => TransitionResult::new(state.clone()),
    }
}

fn on_selection(
    state: &SessionState,
    ctx: &DialogContext<'_>,
    tag: SelectionTag,
) -> TransitionResult {
    // Buttons outlive their dialog. Only end the session if it is the dialog
    // the button belongs to.
    let after = |owner: SessionState| {
        if *state == owner {
            SessionState::Idle
        } else {
            state.clone()
        }
    };

    match tag {
        SelectionTag::Remove(index) => {
            let next = after(SessionState::AwaitingRemovalSelection);
            match resolve_removal(ctx.entries, index) {
                Ok(entry) => TransitionResult::new(next)
                    .with_mutation(Mutation::RemoveAt(index))
                    .with_reply(Reply::EditSelected(formatting::removed(entry))),
                Err(_) => TransitionResult::new(next).with_reply(Reply::EditSelected(
                    formatting::ITEM_NOT_FOUND.to_string(),
                )),
            }
        }
        SelectionTag::RemoveCancel => TransitionResult::new(after(
            SessionState::AwaitingRemovalSelection,
        ))
        .with_reply(Reply::EditSelected(
            formatting::OPERATION_CANCELLED.to_string(),
        )),
        SelectionTag::ClearConfirm => {
            TransitionResult::new(after(SessionState::AwaitingClearConfirmation))
                .with_mutation(Mutation::ClearAll)
                .with_reply(Reply::EditSelected(formatting::LIST_CLEARED.to_string()))
        }
        SelectionTag::ClearCancel => {
            TransitionResult::new(after(SessionState::AwaitingClearConfirmation)).with_reply(
                Reply::EditSelected(formatting::CLEAR_CANCELLED.to_string()),
            )
        }
    }
}
