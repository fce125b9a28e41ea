//! Core of entrysync: a note CRUD screen bound to a live document
//! collection.
//!
//! The screen session (`screen`) talks to the collection only through the
//! `RemoteStoreClient` contract (`store`); `LocalStoreClient` is the
//! SQLite-backed implementation.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod screen;
pub mod store;

pub use config::{ConfigError, DbLocation, StoreConfig, DEFAULT_COLLECTION};
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::entry::{Entry, EntryId, EntryValidationError, MISSING_CONTENT_PLACEHOLDER};
pub use screen::form::{FormController, SubmitOutcome};
pub use screen::notifier::{LogNotifier, NoticeQueue, Notifier};
pub use screen::subscription::{SubscriptionManager, SubscriptionState};
pub use screen::view::{RowView, ScreenView, SubmitLabel};
pub use screen::{EntryScreen, ScreenEvent, WriteCompletion};
pub use store::document_repo::{
    DocumentRepository, RepoError, RepoResult, SqliteDocumentRepository,
};
pub use store::local_client::{LocalStoreClient, StoreOpenError};
pub use store::{
    pending, ListenerRegistration, Pending, RemoteListenError, RemoteStoreClient,
    RemoteWriteError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
