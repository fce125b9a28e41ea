//! Entry screen session.
//!
//! # Responsibility
//! - Own the in-memory entry list, form state and live subscription of one
//!   screen session.
//! - Serialize store callbacks onto the thread that owns the screen.
//!
//! # Invariants
//! - The list is replaced wholesale by each current-generation snapshot.
//! - Listener errors never clear or alter the list.
//! - Every write failure is surfaced once through the notifier, teardown
//!   included; nothing is retried or rolled back.

pub mod form;
pub mod notifier;
pub mod subscription;
pub mod view;

use crate::model::entry::{Entry, EntryId};
use crate::store::{RemoteListenError, RemoteStoreClient, RemoteWriteError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use form::{FormController, SubmitOutcome};
use log::{debug, info, warn};
use notifier::{Notifier, NOTICE_DELETED, NOTICE_SAVED, NOTICE_UPDATED};
use std::sync::Arc;
use std::time::Duration;
use subscription::{SubscriptionManager, SubscriptionState};
use view::ScreenView;

/// Outcome of one write, posted back to the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCompletion {
    Created(Result<EntryId, RemoteWriteError>),
    Updated(Result<(), RemoteWriteError>),
    Deleted(Result<(), RemoteWriteError>),
}

/// Store-originated event awaiting handling on the screen thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    Snapshot {
        generation: u64,
        entries: Vec<Entry>,
    },
    ListenFailed {
        generation: u64,
        error: RemoteListenError,
    },
    WriteCompleted(WriteCompletion),
}

/// One CRUD screen bound to a live collection.
pub struct EntryScreen<C: RemoteStoreClient + ?Sized> {
    store: Arc<C>,
    entries: Vec<Entry>,
    form: FormController<C>,
    subscription: SubscriptionManager,
    notifier: Box<dyn Notifier>,
    events_tx: Sender<ScreenEvent>,
    events_rx: Receiver<ScreenEvent>,
}

impl<C: RemoteStoreClient + ?Sized> EntryScreen<C> {
    /// Creates an inactive screen; call `activate` to start listening.
    pub fn new(store: Arc<C>, notifier: impl Notifier + 'static) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            form: FormController::new(Arc::clone(&store), events_tx.clone()),
            store,
            entries: Vec::new(),
            subscription: SubscriptionManager::new(),
            notifier: Box::new(notifier),
            events_tx,
            events_rx,
        }
    }

    /// Starts (or restarts) the live subscription.
    pub fn activate(&mut self) {
        self.subscription
            .activate(self.store.as_ref(), &self.events_tx);
        info!(
            "event=screen_activate module=screen status=ok generation={}",
            self.subscription.generation()
        );
    }

    /// Cancels the subscription and discards the in-memory list.
    ///
    /// Queued snapshots and listener errors are dropped; queued write
    /// outcomes are still reported through the notifier.
    pub fn teardown(&mut self) {
        self.subscription.teardown();
        self.entries.clear();
        let mut reported = 0;
        let mut dropped = 0;
        for event in self.events_rx.try_iter() {
            match event {
                ScreenEvent::WriteCompleted(completion) => {
                    self.report_write(completion);
                    reported += 1;
                }
                ScreenEvent::Snapshot { .. } | ScreenEvent::ListenFailed { .. } => dropped += 1,
            }
        }
        info!(
            "event=screen_teardown module=screen status=ok reported_writes={} dropped_events={}",
            reported, dropped
        );
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.subscription.state()
    }

    /// Entries from the latest snapshot, in delivery order.
    pub fn entries(&self) -> &[Entry] {
        self.entries.as_slice()
    }

    pub fn form(&self) -> &FormController<C> {
        &self.form
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.form.set_draft_text(text);
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        self.form.on_submit()
    }

    pub fn request_edit(&mut self, entry: &Entry) {
        self.form.on_edit_requested(entry);
    }

    /// Starts editing the listed entry with `id`. Returns `false` when the
    /// current list has no such entry.
    pub fn request_edit_by_id(&mut self, id: &EntryId) -> bool {
        match self.entries.iter().find(|entry| &entry.id == id) {
            Some(entry) => {
                self.form.on_edit_requested(entry);
                true
            }
            None => false,
        }
    }

    pub fn request_delete(&mut self, id: &EntryId) {
        self.form.on_delete_requested(id);
    }

    /// Handles every queued event without blocking. Returns how many were
    /// taken off the queue.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Waits up to `timeout` for one event and handles it.
    pub fn wait_for_event(&mut self, timeout: Duration) -> bool {
        match self.events_rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event);
                true
            }
            Err(_) => false,
        }
    }

    pub fn view(&self) -> ScreenView {
        view::render(
            &self.entries,
            self.form.draft_text(),
            self.form.editing_target(),
        )
    }

    fn handle_event(&mut self, event: ScreenEvent) {
        match event {
            ScreenEvent::Snapshot {
                generation,
                entries,
            } => {
                if !self.subscription.is_current(generation) {
                    debug!(
                        "event=snapshot_apply module=screen status=skipped generation={}",
                        generation
                    );
                    return;
                }
                debug!(
                    "event=snapshot_apply module=screen status=ok generation={} entries={}",
                    generation,
                    entries.len()
                );
                self.entries = entries;
            }
            ScreenEvent::ListenFailed { generation, error } => {
                if !self.subscription.is_current(generation) {
                    return;
                }
                warn!(
                    "event=listen_error module=screen status=error generation={} error={}",
                    generation, error
                );
                self.notifier
                    .notify(&format!("Failed to load entries: {error}"));
            }
            ScreenEvent::WriteCompleted(completion) => self.report_write(completion),
        }
    }

    fn report_write(&self, completion: WriteCompletion) {
        let message = match completion {
            WriteCompletion::Created(Ok(_)) => NOTICE_SAVED.to_string(),
            WriteCompletion::Created(Err(err)) => format!("Failed to save entry: {err}"),
            WriteCompletion::Updated(Ok(())) => NOTICE_UPDATED.to_string(),
            WriteCompletion::Updated(Err(err)) => format!("Failed to update entry: {err}"),
            WriteCompletion::Deleted(Ok(())) => NOTICE_DELETED.to_string(),
            WriteCompletion::Deleted(Err(err)) => format!("Failed to delete entry: {err}"),
        };
        self.notifier.notify(&message);
    }
}
