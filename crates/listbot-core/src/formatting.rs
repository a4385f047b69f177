//! User-facing texts and list rendering.

use crate::store::ListEntry;

pub const WELCOME: &str = "Welcome to the Collaborative List Bot!\n\n\
Use /list to view the current list\n\
Use /add to add a new item\n\
Use /help to see all available commands";

pub const HELP: &str = "Available commands:\n\n\
/start - Start the bot\n\
/help - Show this help message\n\
/list - View the current list\n\
/add - Add a new item to the list\n\
/remove - Remove an item from the list\n\
/clear - Clear the entire list\n\
/cancel - Cancel the current operation";

pub const EMPTY_LIST: &str = "The list is empty. Use /add to add items.";
pub const NOTHING_TO_REMOVE: &str = "The list is empty. Nothing to remove.";

pub const ASK_ITEM: &str = "Please enter the item name:";
pub const ASK_PERSON: &str = "Who will provide this item?";
pub const ASK_COMMENT: &str = "Any comments? (or type 'none' if no comments)";

pub const OPERATION_CANCELLED: &str = "Operation cancelled.";
pub const SELECT_TO_REMOVE: &str = "Select an item to remove:";
pub const ITEM_NOT_FOUND: &str = "Error: Item not found.";
pub const CANCEL_LABEL: &str = "Cancel";

pub const CONFIRM_CLEAR: &str = "Are you sure you want to clear the entire list?";
pub const CLEAR_YES_LABEL: &str = "Yes, clear it";
pub const CLEAR_NO_LABEL: &str = "No, keep it";
pub const LIST_CLEARED: &str = "The list has been cleared.";
pub const CLEAR_CANCELLED: &str = "Clear operation cancelled. The list remains unchanged.";

const LIST_HEADER: &str = "📋 Current List:\n\n";

pub fn added(entry: &ListEntry) -> String {
    format!(
        "Added: {} (Person: {})\n\nUse /list to view the updated list.",
        entry.item, entry.person
    )
}

pub fn removed(entry: &ListEntry) -> String {
    format!("Removed: {} (Person: {})", entry.item, entry.person)
}

/// Button label for a removal option; `position` is 1-based.
pub fn removal_label(position: usize, entry: &ListEntry, max_len: usize) -> String {
    truncate_label(
        &format!("{position}. {} ({})", entry.item, entry.person),
        max_len,
    )
}

/// Cut a label to `max_len` chars, marking the cut with `...`.
pub fn truncate_label(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        return label.to_string();
    }
    let mut out = label.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}

fn render_entry(position: usize, entry: &ListEntry) -> String {
    format!(
        "{position}. Item: {}\n   Person: {}\n   Comment: {}\n\n",
        entry.item, entry.person, entry.comment
    )
}

/// Render a chat's list as one or more messages of at most `limit` bytes.
///
/// Messages break between entries; a single entry larger than `limit` is
/// hard-split on char boundaries.
pub fn render_list(entries: &[ListEntry], limit: usize) -> Vec<String> {
    if entries.is_empty() {
        return vec![EMPTY_LIST.to_string()];
    }

    let limit = limit.max(LIST_HEADER.len() + 1);
    let mut out: Vec<String> = Vec::new();
    let mut chunk = LIST_HEADER.to_string();

    for (i, entry) in entries.iter().enumerate() {
        let block = render_entry(i + 1, entry);
        if chunk.len() + block.len() > limit && !chunk.is_empty() {
            out.push(std::mem::take(&mut chunk));
        }
        if block.len() > limit {
            let mut pieces = split_at_char_boundaries(&block, limit);
            // Keep the tail open so following entries can share it.
            chunk = pieces.pop().unwrap_or_default();
            out.extend(pieces);
        } else {
            chunk.push_str(&block);
        }
    }

    if !chunk.is_empty() {
        out.push(chunk);
    }

    out.into_iter()
        .map(|s| s.trim_end().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn split_at_char_boundaries(s: &str, limit: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    for ch in s.chars() {
        if cur.len() + ch.len_utf8() > limit {
            out.push(std::mem::take(&mut cur));
        }
        cur.push(ch);
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}
