//! SQLite-backed document store client with a dedicated worker thread.
//!
//! # Responsibility
//! - Serve `RemoteStoreClient` calls without blocking the caller.
//! - Re-read the full collection after every mutation and broadcast it.
//! - Model store reachability so write and listener failures surface the
//!   same way a network outage would.
//!
//! # Invariants
//! - Commands are applied in FIFO order by a single worker that owns the
//!   connection.
//! - Every write callback is invoked exactly once, including after shutdown.
//! - A new listener receives the current collection before any later
//!   mutation is reported to it.

use crate::config::StoreConfig;
use crate::db::{open_location, DbError};
use crate::model::entry::{Entry, EntryId};
use crate::store::document_repo::{
    DocumentRepository, RepoError, RepoResult, SqliteDocumentRepository,
};
use crate::store::listeners::{ListenerId, ListenerRegistry};
use crate::store::{
    ListenErrorCallback, ListenerRegistration, RemoteListenError, RemoteStoreClient,
    RemoteWriteError, SnapshotCallback, WriteCallback,
};
use crossbeam_channel::{unbounded, Receiver, SendError, Sender};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

const WORKER_THREAD_NAME: &str = "entrysync-store";
const UNREACHABLE_REASON: &str = "document store is unreachable";
const STOPPED_REASON: &str = "document store worker has stopped";

/// Failure to bring up a local store client.
#[derive(Debug)]
pub enum StoreOpenError {
    Db(DbError),
    Spawn(std::io::Error),
}

impl Display for StoreOpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Spawn(err) => write!(f, "failed to start store worker: {err}"),
        }
    }
}

impl Error for StoreOpenError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Spawn(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreOpenError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

enum Command {
    Create {
        content: String,
        reply: WriteCallback<EntryId>,
    },
    Update {
        id: EntryId,
        content: String,
        reply: WriteCallback<()>,
    },
    Delete {
        id: EntryId,
        reply: WriteCallback<()>,
    },
    Attach {
        listener: ListenerId,
    },
    SetReachable {
        reachable: bool,
    },
    Shutdown,
}

/// Document store client whose collection lives in a local SQLite file or
/// in memory.
pub struct LocalStoreClient {
    commands: Sender<Command>,
    listeners: Arc<ListenerRegistry>,
    collection: String,
    worker: Option<JoinHandle<()>>,
}

impl LocalStoreClient {
    /// Opens the database, applies migrations and starts the store worker.
    ///
    /// # Errors
    /// - `StoreOpenError::Db` when the database cannot be opened or migrated.
    /// - `StoreOpenError::Spawn` when the worker thread cannot start.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreOpenError> {
        let conn = open_location(&config.location)?;
        let listeners = Arc::new(ListenerRegistry::new());
        let (commands, inbox) = unbounded();

        let worker = StoreWorker {
            conn,
            collection: config.collection.clone(),
            listeners: Arc::clone(&listeners),
            reachable: true,
            last_created_at: 0,
        };
        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || worker.run(inbox))
            .map_err(StoreOpenError::Spawn)?;

        info!(
            "event=store_open module=store status=ok collection={}",
            config.collection
        );
        Ok(Self {
            commands,
            listeners,
            collection: config.collection.clone(),
            worker: Some(handle),
        })
    }

    /// Collection this client is bound to.
    pub fn collection(&self) -> &str {
        self.collection.as_str()
    }

    /// Number of live listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Marks the store reachable or unreachable.
    ///
    /// Going unreachable interrupts live listeners once; coming back sends
    /// every listener a fresh snapshot.
    pub fn set_reachable(&self, reachable: bool) {
        self.dispatch(Command::SetReachable { reachable });
    }

    fn dispatch(&self, command: Command) {
        if let Err(SendError(command)) = self.commands.send(command) {
            warn!("event=store_dispatch module=store status=error error_code=worker_stopped");
            match command {
                Command::Create { reply, .. } => {
                    reply(Err(RemoteWriteError::Unavailable(STOPPED_REASON.to_string())))
                }
                Command::Update { reply, .. } | Command::Delete { reply, .. } => {
                    reply(Err(RemoteWriteError::Unavailable(STOPPED_REASON.to_string())))
                }
                Command::Attach { listener } => {
                    self.listeners.deliver_error(
                        listener,
                        RemoteListenError::EstablishFailed(STOPPED_REASON.to_string()),
                    );
                }
                Command::SetReachable { .. } | Command::Shutdown => {}
            }
        }
    }
}

impl RemoteStoreClient for LocalStoreClient {
    fn create(&self, content: &str, on_complete: WriteCallback<EntryId>) {
        self.dispatch(Command::Create {
            content: content.to_string(),
            reply: on_complete,
        });
    }

    fn update(&self, id: &EntryId, content: &str, on_complete: WriteCallback<()>) {
        self.dispatch(Command::Update {
            id: id.clone(),
            content: content.to_string(),
            reply: on_complete,
        });
    }

    fn delete(&self, id: &EntryId, on_complete: WriteCallback<()>) {
        self.dispatch(Command::Delete {
            id: id.clone(),
            reply: on_complete,
        });
    }

    fn subscribe(
        &self,
        on_change: SnapshotCallback,
        on_error: ListenErrorCallback,
    ) -> ListenerRegistration {
        let listener = self.listeners.register(on_change, on_error);
        info!(
            "event=listener_attach module=store status=start listener_id={} collection={}",
            listener.0, self.collection
        );
        self.dispatch(Command::Attach { listener });

        let registry = Arc::downgrade(&self.listeners);
        ListenerRegistration::new(move || {
            if let Some(registry) = registry.upgrade() {
                if registry.remove(listener) {
                    info!(
                        "event=listener_remove module=store status=ok listener_id={}",
                        listener.0
                    );
                }
            }
        })
    }
}

impl Drop for LocalStoreClient {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("event=store_close module=store status=error error_code=worker_panicked");
            }
        }
    }
}

struct StoreWorker {
    conn: Connection,
    collection: String,
    listeners: Arc<ListenerRegistry>,
    reachable: bool,
    /// Creation stamps handed out by this worker are strictly increasing.
    last_created_at: i64,
}

impl StoreWorker {
    fn run(mut self, inbox: Receiver<Command>) {
        info!(
            "event=store_worker module=store status=start collection={}",
            self.collection
        );
        for command in inbox.iter() {
            if let Command::Shutdown = command {
                break;
            }
            self.handle(command);
        }
        info!(
            "event=store_worker module=store status=stop collection={}",
            self.collection
        );
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Create { content, reply } => {
                let created_at = now_epoch_ms().max(self.last_created_at + 1);
                self.last_created_at = created_at;
                self.apply_write("create", content.len(), reply, |repo| {
                    repo.insert_document(&content, created_at)
                });
            }
            Command::Update { id, content, reply } => {
                self.apply_write("update", content.len(), reply, |repo| {
                    repo.update_content(&id, &content)
                });
            }
            Command::Delete { id, reply } => {
                self.apply_write("delete", 0, reply, |repo| repo.delete_document(&id));
            }
            Command::Attach { listener } => self.attach(listener),
            Command::SetReachable { reachable } => self.set_reachable(reachable),
            Command::Shutdown => {}
        }
    }

    fn apply_write<T>(
        &self,
        op: &'static str,
        content_len: usize,
        reply: WriteCallback<T>,
        write: impl FnOnce(&SqliteDocumentRepository<'_>) -> RepoResult<T>,
    ) {
        if !self.reachable {
            warn!(
                "event=entry_write module=store status=error op={} error_code=unreachable",
                op
            );
            reply(Err(RemoteWriteError::Unavailable(
                UNREACHABLE_REASON.to_string(),
            )));
            return;
        }

        let started_at = Instant::now();
        let result = SqliteDocumentRepository::try_new(&self.conn, &self.collection)
            .and_then(|repo| write(&repo));
        match result {
            Ok(value) => {
                info!(
                    "event=entry_write module=store status=ok op={} content_len={} duration_ms={}",
                    op,
                    content_len,
                    started_at.elapsed().as_millis()
                );
                reply(Ok(value));
                self.publish();
            }
            Err(err) => {
                warn!(
                    "event=entry_write module=store status=error op={} duration_ms={} error={}",
                    op,
                    started_at.elapsed().as_millis(),
                    err
                );
                reply(Err(to_write_error(err)));
            }
        }
    }

    fn attach(&self, listener: ListenerId) {
        if !self.reachable {
            self.listeners.deliver_error(
                listener,
                RemoteListenError::EstablishFailed(UNREACHABLE_REASON.to_string()),
            );
            return;
        }

        match self.snapshot() {
            Ok(entries) => {
                if self.listeners.deliver_snapshot(listener, entries) {
                    info!(
                        "event=listener_attach module=store status=ok listener_id={}",
                        listener.0
                    );
                }
            }
            Err(err) => {
                error!(
                    "event=listener_attach module=store status=error listener_id={} error={}",
                    listener.0, err
                );
                self.listeners.deliver_error(
                    listener,
                    RemoteListenError::EstablishFailed(err.to_string()),
                );
            }
        }
    }

    fn set_reachable(&mut self, reachable: bool) {
        if self.reachable == reachable {
            return;
        }
        self.reachable = reachable;
        info!(
            "event=store_reachability module=store status=ok reachable={}",
            reachable
        );
        if reachable {
            self.publish();
        } else {
            self.listeners
                .broadcast_error(&RemoteListenError::Interrupted(
                    UNREACHABLE_REASON.to_string(),
                ));
        }
    }

    fn publish(&self) {
        match self.snapshot() {
            Ok(entries) => self.listeners.broadcast_snapshot(&entries),
            Err(err) => {
                error!(
                    "event=snapshot_broadcast module=store status=error error={}",
                    err
                );
                self.listeners
                    .broadcast_error(&RemoteListenError::Interrupted(err.to_string()));
            }
        }
    }

    fn snapshot(&self) -> RepoResult<Vec<Entry>> {
        SqliteDocumentRepository::try_new(&self.conn, &self.collection)?.list_documents()
    }
}

fn to_write_error(err: RepoError) -> RemoteWriteError {
    match err {
        RepoError::NotFound(id) => RemoteWriteError::NotFound(id),
        RepoError::Validation(err) => RemoteWriteError::Rejected(err.to_string()),
        other => RemoteWriteError::Storage(other.to_string()),
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
