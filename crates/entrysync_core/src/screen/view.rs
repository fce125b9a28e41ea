//! Rendering projection of the entry screen.
//!
//! Pure functions only: the view holds no state of its own.

use crate::model::entry::{Entry, EntryId};
use once_cell::sync::Lazy;
use regex::Regex;

pub const EMPTY_LIST_MESSAGE: &str = "No entries found.";
pub const LIST_HEADING: &str = "Stored entries:";

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Submit button label, driven by edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitLabel {
    Save,
    Update,
}

impl SubmitLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "Save",
            Self::Update => "Update",
        }
    }
}

/// One list row with edit/delete actions keyed by `entry_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub entry_id: EntryId,
    /// Content collapsed to a single line.
    pub label: String,
}

/// Everything the presentation layer needs to draw the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenView {
    pub draft_text: String,
    pub submit_label: SubmitLabel,
    pub is_editing: bool,
    /// Present only when there are rows.
    pub list_heading: Option<&'static str>,
    /// Rows in the order the last snapshot delivered them.
    pub rows: Vec<RowView>,
    /// Present only when there are no rows.
    pub empty_message: Option<&'static str>,
}

/// Projects the current list and form state into a `ScreenView`.
pub fn render(entries: &[Entry], draft_text: &str, editing_target: Option<&Entry>) -> ScreenView {
    let is_editing = editing_target.is_some();
    let rows = entries
        .iter()
        .map(|entry| RowView {
            entry_id: entry.id.clone(),
            label: row_label(entry.content.as_str()),
        })
        .collect::<Vec<_>>();
    let has_rows = !rows.is_empty();

    ScreenView {
        draft_text: draft_text.to_string(),
        submit_label: if is_editing {
            SubmitLabel::Update
        } else {
            SubmitLabel::Save
        },
        is_editing,
        list_heading: has_rows.then_some(LIST_HEADING),
        rows,
        empty_message: (!has_rows).then_some(EMPTY_LIST_MESSAGE),
    }
}

/// Collapses whitespace runs (including newlines) into single spaces.
pub fn row_label(content: &str) -> String {
    WHITESPACE_RE.replace_all(content, " ").into_owned()
}
