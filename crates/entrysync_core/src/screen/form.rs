//! Form controller: draft text, edit target and write dispatch.
//!
//! # Invariants
//! - An empty draft never reaches the store.
//! - Submit clears the form immediately; the write outcome arrives later as
//!   a `ScreenEvent::WriteCompleted` and never restores the form.
//! - Delete leaves draft and edit target untouched, even when the deleted
//!   entry is the one being edited.

use crate::model::entry::{Entry, EntryId};
use crate::screen::{ScreenEvent, WriteCompletion};
use crate::store::{RemoteStoreClient, RemoteWriteError};
use crossbeam_channel::Sender;
use log::{debug, info};
use std::sync::Arc;

/// What a submit intent turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Draft was empty; nothing was sent.
    Ignored,
    /// A create was sent.
    Created,
    /// An update of the given entry was sent.
    Updated(EntryId),
}

/// Transient form state bound to one store.
pub struct FormController<C: RemoteStoreClient + ?Sized> {
    store: Arc<C>,
    events: Sender<ScreenEvent>,
    draft_text: String,
    editing_target: Option<Entry>,
}

impl<C: RemoteStoreClient + ?Sized> FormController<C> {
    pub fn new(store: Arc<C>, events: Sender<ScreenEvent>) -> Self {
        Self {
            store,
            events,
            draft_text: String::new(),
            editing_target: None,
        }
    }

    pub fn draft_text(&self) -> &str {
        self.draft_text.as_str()
    }

    pub fn editing_target(&self) -> Option<&Entry> {
        self.editing_target.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.editing_target.is_some()
    }

    /// Text-field binding.
    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
    }

    /// Sends the draft as a create or an update without awaiting the write.
    pub fn on_submit(&mut self) -> SubmitOutcome {
        if self.draft_text.is_empty() {
            debug!("event=form_submit module=screen status=ignored reason=empty_draft");
            return SubmitOutcome::Ignored;
        }

        let content = std::mem::take(&mut self.draft_text);
        match self.editing_target.take() {
            Some(target) => {
                info!(
                    "event=form_submit module=screen status=ok op=update entry_id={} content_len={}",
                    target.id,
                    content.len()
                );
                let events = self.events.clone();
                self.store.update(
                    &target.id,
                    &content,
                    Box::new(move |result: Result<(), RemoteWriteError>| {
                        let _ = events.send(ScreenEvent::WriteCompleted(
                            WriteCompletion::Updated(result),
                        ));
                    }),
                );
                SubmitOutcome::Updated(target.id)
            }
            None => {
                info!(
                    "event=form_submit module=screen status=ok op=create content_len={}",
                    content.len()
                );
                let events = self.events.clone();
                self.store.create(
                    &content,
                    Box::new(move |result: Result<EntryId, RemoteWriteError>| {
                        let _ = events.send(ScreenEvent::WriteCompleted(
                            WriteCompletion::Created(result),
                        ));
                    }),
                );
                SubmitOutcome::Created
            }
        }
    }

    /// Loads `entry` into the form for in-place update.
    pub fn on_edit_requested(&mut self, entry: &Entry) {
        self.draft_text = entry.content.clone();
        self.editing_target = Some(entry.clone());
        debug!(
            "event=form_edit module=screen status=ok entry_id={}",
            entry.id
        );
    }

    /// Sends a delete for `id`; form state is left as is.
    pub fn on_delete_requested(&mut self, id: &EntryId) {
        info!("event=form_delete module=screen status=ok entry_id={}", id);
        let events = self.events.clone();
        self.store.delete(
            id,
            Box::new(move |result: Result<(), RemoteWriteError>| {
                let _ = events.send(ScreenEvent::WriteCompleted(WriteCompletion::Deleted(
                    result,
                )));
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{FormController, SubmitOutcome};
    use crate::model::entry::{Entry, EntryId};
    use crate::screen::testing::{RecordedCall, RecordingStore};
    use crate::screen::{ScreenEvent, WriteCompletion};
    use crate::store::RemoteWriteError;
    use crossbeam_channel::unbounded;
    use std::sync::Arc;

    #[test]
    fn empty_submit_sends_nothing_and_keeps_state() {
        let store = Arc::new(RecordingStore::new());
        let (events, _inbox) = unbounded();
        let mut form = FormController::new(Arc::clone(&store), events);

        assert_eq!(form.on_submit(), SubmitOutcome::Ignored);
        assert!(store.calls().is_empty());
        assert_eq!(form.draft_text(), "");
        assert!(!form.is_editing());
    }

    #[test]
    fn submit_without_target_creates_and_clears_draft() {
        let store = Arc::new(RecordingStore::new());
        let (events, inbox) = unbounded();
        let mut form = FormController::new(Arc::clone(&store), events);

        form.set_draft_text("buy milk");
        assert_eq!(form.on_submit(), SubmitOutcome::Created);
        assert_eq!(form.draft_text(), "");
        assert_eq!(
            store.calls(),
            vec![RecordedCall::Create("buy milk".to_string())]
        );
        assert!(matches!(
            inbox.try_recv(),
            Ok(ScreenEvent::WriteCompleted(WriteCompletion::Created(Ok(_))))
        ));
    }

    #[test]
    fn submit_with_target_updates_and_clears_both_fields() {
        let store = Arc::new(RecordingStore::new());
        let (events, _inbox) = unbounded();
        let mut form = FormController::new(Arc::clone(&store), events);
        let entry = Entry::new(EntryId::new("doc-1"), "buy milk", 1);

        form.on_edit_requested(&entry);
        assert_eq!(form.draft_text(), "buy milk");
        assert_eq!(form.editing_target(), Some(&entry));

        form.set_draft_text("buy milk and eggs");
        assert_eq!(
            form.on_submit(),
            SubmitOutcome::Updated(EntryId::new("doc-1"))
        );
        assert_eq!(form.draft_text(), "");
        assert!(!form.is_editing());
        assert_eq!(
            store.calls(),
            vec![RecordedCall::Update(
                EntryId::new("doc-1"),
                "buy milk and eggs".to_string()
            )]
        );
    }

    #[test]
    fn failed_update_still_clears_form() {
        let store = Arc::new(RecordingStore::new());
        store.fail_writes_with(RemoteWriteError::Unavailable("offline".to_string()));
        let (events, inbox) = unbounded();
        let mut form = FormController::new(Arc::clone(&store), events);

        form.on_edit_requested(&Entry::new(EntryId::new("doc-1"), "old", 1));
        form.set_draft_text("new");
        form.on_submit();

        assert_eq!(form.draft_text(), "");
        assert!(!form.is_editing());
        assert!(matches!(
            inbox.try_recv(),
            Ok(ScreenEvent::WriteCompleted(WriteCompletion::Updated(Err(
                RemoteWriteError::Unavailable(_)
            ))))
        ));
    }

    #[test]
    fn delete_of_edited_entry_keeps_orphaned_edit_state() {
        let store = Arc::new(RecordingStore::new());
        let (events, _inbox) = unbounded();
        let mut form = FormController::new(Arc::clone(&store), events);
        let entry = Entry::new(EntryId::new("doc-1"), "buy milk", 1);

        form.on_edit_requested(&entry);
        form.on_delete_requested(&entry.id);

        assert_eq!(form.draft_text(), "buy milk");
        assert_eq!(form.editing_target(), Some(&entry));
        assert_eq!(
            store.calls(),
            vec![RecordedCall::Delete(EntryId::new("doc-1"))]
        );
    }
}
