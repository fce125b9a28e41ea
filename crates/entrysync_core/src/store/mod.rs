//! Remote document store client contracts.
//!
//! # Responsibility
//! - Define the asynchronous create/update/delete/subscribe contract the
//!   screen talks to.
//! - Provide completion plumbing (`pending`) and scoped listener handles.
//!
//! # Invariants
//! - Every write reports its outcome exactly once through its callback.
//! - Snapshot callbacks always receive the complete collection.
//! - Once `ListenerRegistration::remove` returns, the listener's callbacks
//!   never fire again.

use crate::model::entry::{Entry, EntryId};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod document_repo;
pub mod listeners;
pub mod local_client;

/// Failure of a create/update/delete call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteWriteError {
    /// Target document does not exist.
    NotFound(EntryId),
    /// The store refused the write.
    Rejected(String),
    /// The store could not be reached.
    Unavailable(String),
    /// The store accepted the request but failed to persist it.
    Storage(String),
}

impl Display for RemoteWriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::Rejected(reason) => write!(f, "write rejected: {reason}"),
            Self::Unavailable(reason) => write!(f, "store unavailable: {reason}"),
            Self::Storage(reason) => write!(f, "storage failure: {reason}"),
        }
    }
}

impl Error for RemoteWriteError {}

/// Failure of a live-query subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteListenError {
    /// The listener could not be attached.
    EstablishFailed(String),
    /// A live listener lost its connection to the collection.
    Interrupted(String),
}

impl Display for RemoteListenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EstablishFailed(reason) => write!(f, "listener not established: {reason}"),
            Self::Interrupted(reason) => write!(f, "listener interrupted: {reason}"),
        }
    }
}

impl Error for RemoteListenError {}

/// One-shot completion callback for a write.
pub type WriteCallback<T> = Box<dyn FnOnce(Result<T, RemoteWriteError>) + Send + 'static>;
/// Receives the full collection on every change.
pub type SnapshotCallback = Box<dyn FnMut(Vec<Entry>) + Send + 'static>;
/// Receives listener failures.
pub type ListenErrorCallback = Box<dyn FnMut(RemoteListenError) + Send + 'static>;

/// Asynchronous client for one document collection.
///
/// No method blocks the caller; outcomes arrive through callbacks, possibly
/// on another thread.
pub trait RemoteStoreClient: Send + Sync {
    /// Appends a document and reports its assigned id.
    fn create(&self, content: &str, on_complete: WriteCallback<EntryId>);
    /// Replaces the `content` field of one document.
    fn update(&self, id: &EntryId, content: &str, on_complete: WriteCallback<()>);
    /// Removes one document.
    fn delete(&self, id: &EntryId, on_complete: WriteCallback<()>);
    /// Registers a live listener over the whole collection.
    ///
    /// Callbacks may call back into the client, including removing their
    /// own registration. Once `ListenerRegistration::remove` returns, no
    /// callback of that listener starts.
    fn subscribe(
        &self,
        on_change: SnapshotCallback,
        on_error: ListenErrorCallback,
    ) -> ListenerRegistration;
}

/// Handle to an outstanding write, for callers that want to await it.
pub struct Pending<T> {
    receiver: Receiver<Result<T, RemoteWriteError>>,
}

impl<T> Pending<T> {
    /// Blocks until the write completes.
    pub fn wait(self) -> Result<T, RemoteWriteError> {
        self.receiver.recv().unwrap_or_else(|_| {
            Err(RemoteWriteError::Unavailable(
                "completion dropped before reporting".to_string(),
            ))
        })
    }

    /// Blocks for at most `timeout`; `None` when the write is still running.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, RemoteWriteError>> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(RemoteWriteError::Unavailable(
                "completion dropped before reporting".to_string(),
            ))),
        }
    }
}

/// Creates a write callback paired with a handle that observes its outcome.
pub fn pending<T: Send + 'static>() -> (WriteCallback<T>, Pending<T>) {
    let (sender, receiver) = bounded(1);
    let callback: WriteCallback<T> = Box::new(move |result| {
        let _ = sender.send(result);
    });
    (callback, Pending { receiver })
}

/// Scoped live-listener registration.
///
/// Cancels on `remove()` or on drop, whichever comes first.
pub struct ListenerRegistration {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl ListenerRegistration {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancels the listener. Safe to call more than once.
    pub fn remove(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        self.remove();
    }
}
