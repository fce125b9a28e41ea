//! Live subscription lifecycle for one screen session.
//!
//! # Invariants
//! - At most one registration is held at a time.
//! - Re-activation cancels the previous registration before subscribing.
//! - Every activation gets a new generation; events carry it so the screen
//!   can drop ones queued by a cancelled registration.

use crate::model::entry::Entry;
use crate::screen::ScreenEvent;
use crate::store::{ListenerRegistration, RemoteListenError, RemoteStoreClient};
use crossbeam_channel::Sender;
use log::info;

/// Subscription manager state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribed,
}

/// Owns the screen's single live-query registration.
#[derive(Default)]
pub struct SubscriptionManager {
    registration: Option<ListenerRegistration>,
    generation: u64,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SubscriptionState {
        if self.registration.is_some() {
            SubscriptionState::Subscribed
        } else {
            SubscriptionState::Unsubscribed
        }
    }

    /// Generation of the latest activation (0 before the first one).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether an event tagged with `generation` belongs to the live
    /// registration.
    pub fn is_current(&self, generation: u64) -> bool {
        self.registration.is_some() && generation == self.generation
    }

    /// Subscribes to `store`, forwarding callbacks into `events`.
    pub fn activate<C>(&mut self, store: &C, events: &Sender<ScreenEvent>)
    where
        C: RemoteStoreClient + ?Sized,
    {
        self.teardown();

        self.generation += 1;
        let generation = self.generation;
        let change_events = events.clone();
        let error_events = events.clone();
        let registration = store.subscribe(
            Box::new(move |entries: Vec<Entry>| {
                let _ = change_events.send(ScreenEvent::Snapshot {
                    generation,
                    entries,
                });
            }),
            Box::new(move |error: RemoteListenError| {
                let _ = error_events.send(ScreenEvent::ListenFailed { generation, error });
            }),
        );
        self.registration = Some(registration);
        info!(
            "event=subscription_activate module=screen status=ok generation={}",
            generation
        );
    }

    /// Cancels the live registration, if any.
    pub fn teardown(&mut self) {
        if let Some(mut registration) = self.registration.take() {
            registration.remove();
            info!(
                "event=subscription_teardown module=screen status=ok generation={}",
                self.generation
            );
        }
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.teardown();
    }
}
