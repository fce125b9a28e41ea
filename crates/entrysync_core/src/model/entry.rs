//! Entry domain model.
//!
//! # Responsibility
//! - Define the note record projected from one collection document.
//! - Provide content validation shared by the form and the store.
//!
//! # Invariants
//! - `id` is assigned by the store and never reused within a collection.
//! - `timestamp` is set once at creation and never updated.
//! - Deletion is a hard delete; there is no tombstone state.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Content shown for documents whose `content` field is missing.
pub const MISSING_CONTENT_PLACEHOLDER: &str = "(no content)";

/// Opaque document identifier assigned by the store on creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntryId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EntryId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Validation error for entry write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    /// Content must contain at least one character.
    EmptyContent,
}

impl Display for EntryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyContent => write!(f, "entry content must not be empty"),
        }
    }
}

impl Error for EntryValidationError {}

/// One note record as seen by listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned stable id.
    pub id: EntryId,
    /// User-supplied text.
    pub content: String,
    /// Creation time in Unix epoch milliseconds.
    pub timestamp: i64,
}

impl Entry {
    pub fn new(id: EntryId, content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id,
            content: content.into(),
            timestamp,
        }
    }

    /// Builds an entry from a stored document, substituting the placeholder
    /// for a missing `content` field.
    pub fn from_document(id: EntryId, content: Option<String>, timestamp: i64) -> Self {
        Self {
            id,
            content: content.unwrap_or_else(|| MISSING_CONTENT_PLACEHOLDER.to_string()),
            timestamp,
        }
    }
}

/// Checks that `content` is acceptable for create/update.
///
/// The check is verbatim: whitespace-only content is accepted.
pub fn validate_content(content: &str) -> Result<(), EntryValidationError> {
    if content.is_empty() {
        return Err(EntryValidationError::EmptyContent);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_content, Entry, EntryId, EntryValidationError};

    #[test]
    fn validate_content_rejects_only_empty_text() {
        assert_eq!(
            validate_content(""),
            Err(EntryValidationError::EmptyContent)
        );
        assert!(validate_content(" ").is_ok());
        assert!(validate_content("buy milk").is_ok());
    }

    #[test]
    fn missing_document_content_uses_placeholder() {
        let entry = Entry::from_document(EntryId::new("a1"), None, 10);
        assert_eq!(entry.content, super::MISSING_CONTENT_PLACEHOLDER);
        assert_eq!(entry.timestamp, 10);
    }

    #[test]
    fn entry_serializes_id_as_plain_string() {
        let entry = Entry::new(EntryId::new("doc-1"), "buy milk", 1_700_000_000_000);
        let value = serde_json::to_value(&entry).expect("entry should serialize");
        assert_eq!(value["id"], "doc-1");
        assert_eq!(value["content"], "buy milk");
        assert_eq!(value["timestamp"], 1_700_000_000_000_i64);

        let decoded: Entry = serde_json::from_value(value).expect("entry should deserialize");
        assert_eq!(decoded, entry);
    }
}
