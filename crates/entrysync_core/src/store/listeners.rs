//! Live listener registry for snapshot broadcasts.
//!
//! # Invariants
//! - Callbacks never run while the registry map is locked, so a callback
//!   may register or remove listeners, including its own.
//! - Each listener sits in its own slot guarded by a re-entrant lock. A
//!   delivery checks the `removed` flag under that lock, and `remove` sets
//!   it under the same lock, so no callback starts after `remove` returns.

use crate::model::entry::Entry;
use crate::store::{ListenErrorCallback, RemoteListenError, SnapshotCallback};
use log::debug;
use parking_lot::{Mutex, ReentrantMutex};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Identifier of one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(pub u64);

struct Listener {
    on_change: SnapshotCallback,
    on_error: ListenErrorCallback,
}

struct SlotState {
    removed: Cell<bool>,
    listener: RefCell<Option<Listener>>,
}

type Slot = Arc<ReentrantMutex<SlotState>>;

/// Registered snapshot listeners.
pub struct ListenerRegistry {
    slots: Mutex<BTreeMap<ListenerId, Slot>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a listener and returns its id.
    pub fn register(
        &self,
        on_change: SnapshotCallback,
        on_error: ListenErrorCallback,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let slot = Arc::new(ReentrantMutex::new(SlotState {
            removed: Cell::new(false),
            listener: RefCell::new(Some(Listener {
                on_change,
                on_error,
            })),
        }));
        self.slots.lock().insert(id, slot);
        id
    }

    /// Removes a listener. Returns whether it was still registered.
    ///
    /// Blocks while another thread is inside one of its callbacks. Called
    /// from inside its own callback, it marks the listener removed and the
    /// callbacks are dropped once that delivery returns.
    pub fn remove(&self, id: ListenerId) -> bool {
        let Some(slot) = self.slots.lock().remove(&id) else {
            return false;
        };
        let state = slot.lock();
        state.removed.set(true);
        if let Ok(mut listener) = state.listener.try_borrow_mut() {
            listener.take();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Sends the full collection to every listener.
    pub fn broadcast_snapshot(&self, entries: &[Entry]) {
        let slots = self.live_slots();
        debug!(
            "event=snapshot_broadcast module=store listeners={} entries={}",
            slots.len(),
            entries.len()
        );
        for slot in &slots {
            with_listener(slot, |listener| (listener.on_change)(entries.to_vec()));
        }
    }

    /// Sends a listener failure to every listener.
    pub fn broadcast_error(&self, error: &RemoteListenError) {
        for slot in &self.live_slots() {
            with_listener(slot, |listener| (listener.on_error)(error.clone()));
        }
    }

    /// Sends the full collection to one listener, if still registered.
    pub fn deliver_snapshot(&self, id: ListenerId, entries: Vec<Entry>) -> bool {
        match self.slot(id) {
            Some(slot) => with_listener(&slot, move |listener| (listener.on_change)(entries)),
            None => false,
        }
    }

    /// Sends a failure to one listener, if still registered.
    pub fn deliver_error(&self, id: ListenerId, error: RemoteListenError) -> bool {
        match self.slot(id) {
            Some(slot) => with_listener(&slot, move |listener| (listener.on_error)(error)),
            None => false,
        }
    }

    fn live_slots(&self) -> Vec<Slot> {
        self.slots.lock().values().cloned().collect()
    }

    fn slot(&self, id: ListenerId) -> Option<Slot> {
        self.slots.lock().get(&id).cloned()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `deliver` against the slot's listener unless it was removed.
/// Returns whether the listener was invoked.
fn with_listener(slot: &Slot, deliver: impl FnOnce(&mut Listener)) -> bool {
    let state = slot.lock();
    if state.removed.get() {
        return false;
    }
    // A nested delivery to the same listener from inside its own callback
    // is skipped.
    let Ok(mut listener) = state.listener.try_borrow_mut() else {
        return false;
    };
    let delivered = match listener.as_mut() {
        Some(listener) => {
            deliver(listener);
            true
        }
        None => false,
    };
    delivered
}

#[cfg(test)]
mod tests {
    use super::{ListenerId, ListenerRegistry};
    use crate::model::entry::{Entry, EntryId};
    use crate::store::RemoteListenError;
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn broadcast_reaches_every_registered_listener() {
        let registry = ListenerRegistry::new();
        let (first_tx, first_rx) = unbounded();
        let (second_tx, second_rx) = unbounded();
        registry.register(
            Box::new(move |entries: Vec<Entry>| {
                let _ = first_tx.send(entries);
            }),
            Box::new(|_: RemoteListenError| {}),
        );
        registry.register(
            Box::new(move |entries: Vec<Entry>| {
                let _ = second_tx.send(entries);
            }),
            Box::new(|_: RemoteListenError| {}),
        );

        let entries = vec![Entry::new(EntryId::new("a"), "one", 1)];
        registry.broadcast_snapshot(&entries);

        assert_eq!(first_rx.try_recv().expect("first listener"), entries);
        assert_eq!(second_rx.try_recv().expect("second listener"), entries);
    }

    #[test]
    fn removed_listener_receives_nothing() {
        let registry = ListenerRegistry::new();
        let (tx, rx) = unbounded::<usize>();
        let error_tx = tx.clone();
        let id = registry.register(
            Box::new(move |entries: Vec<Entry>| {
                let _ = tx.send(entries.len());
            }),
            Box::new(move |_: RemoteListenError| {
                let _ = error_tx.send(usize::MAX);
            }),
        );

        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        registry.broadcast_snapshot(&[]);
        registry.broadcast_error(&RemoteListenError::Interrupted("offline".to_string()));
        assert!(!registry.deliver_snapshot(id, Vec::new()));
        assert!(rx.try_recv().is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn targeted_delivery_only_reaches_one_listener() {
        let registry = ListenerRegistry::new();
        let (tx, rx) = unbounded::<&'static str>();
        let other_tx = tx.clone();
        let target = registry.register(
            Box::new(|_: Vec<Entry>| {}),
            Box::new(move |_: RemoteListenError| {
                let _ = tx.send("target");
            }),
        );
        registry.register(
            Box::new(|_: Vec<Entry>| {}),
            Box::new(move |_: RemoteListenError| {
                let _ = other_tx.send("other");
            }),
        );

        assert!(registry.deliver_error(
            target,
            RemoteListenError::EstablishFailed("offline".to_string())
        ));
        assert_eq!(rx.try_recv(), Ok("target"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn listener_can_remove_itself_from_its_callback() {
        let registry = Arc::new(ListenerRegistry::new());
        let own_id: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let (tx, rx) = unbounded::<usize>();

        let callback_registry = Arc::clone(&registry);
        let callback_id = Arc::clone(&own_id);
        let id = registry.register(
            Box::new(move |entries: Vec<Entry>| {
                let _ = tx.send(entries.len());
                if let Some(id) = callback_id.lock().take() {
                    assert!(callback_registry.remove(id));
                }
            }),
            Box::new(|_: RemoteListenError| {}),
        );
        *own_id.lock() = Some(id);

        registry.broadcast_snapshot(&[Entry::new(EntryId::new("a"), "one", 1)]);
        registry.broadcast_snapshot(&[]);

        assert_eq!(rx.try_recv(), Ok(1));
        assert!(rx.try_recv().is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn listener_can_register_another_from_its_callback() {
        let registry = Arc::new(ListenerRegistry::new());
        let callback_registry = Arc::clone(&registry);
        registry.register(
            Box::new(move |_: Vec<Entry>| {
                if callback_registry.len() == 1 {
                    callback_registry.register(
                        Box::new(|_: Vec<Entry>| {}),
                        Box::new(|_: RemoteListenError| {}),
                    );
                }
            }),
            Box::new(|_: RemoteListenError| {}),
        );

        registry.broadcast_snapshot(&[]);
        assert_eq!(registry.len(), 2);
    }
}
