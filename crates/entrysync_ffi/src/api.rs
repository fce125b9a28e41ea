//! FFI session API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose one entry screen session to Dart via FRB.
//! - Flatten core views and notices into plain DTOs.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Store callbacks are only applied inside `poll`, on the caller's thread.
//! - A closed session ignores every later call.

use entrysync_core::screen::view::render;
use entrysync_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, EntryId,
    EntryScreen, LocalStoreClient, NoticeQueue, ScreenView, StoreConfig, SubmitOutcome,
};
use log::{info, warn};
use std::sync::{Arc, Mutex, MutexGuard};

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// One row of the stored-entries list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRowItem {
    /// Stable document id, passed back to `edit` / `delete`.
    pub entry_id: String,
    /// Single-line row label.
    pub label: String,
}

/// Render state returned by `poll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSnapshot {
    pub draft_text: String,
    /// `Save` or `Update`.
    pub submit_label: String,
    pub is_editing: bool,
    pub heading: Option<String>,
    pub rows: Vec<EntryRowItem>,
    pub empty_message: Option<String>,
}

impl From<ScreenView> for ScreenSnapshot {
    fn from(view: ScreenView) -> Self {
        Self {
            draft_text: view.draft_text,
            submit_label: view.submit_label.as_str().to_string(),
            is_editing: view.is_editing,
            heading: view.list_heading.map(str::to_string),
            rows: view
                .rows
                .into_iter()
                .map(|row| EntryRowItem {
                    entry_id: row.entry_id.to_string(),
                    label: row.label,
                })
                .collect(),
            empty_message: view.empty_message.map(str::to_string),
        }
    }
}

struct SessionInner {
    screen: EntryScreen<LocalStoreClient>,
    notices: NoticeQueue,
}

/// Live entry screen bound to a local document store.
#[flutter_rust_bridge::frb(opaque)]
pub struct EntryScreenSession {
    inner: Mutex<Option<SessionInner>>,
}

impl EntryScreenSession {
    /// Opens the store and activates the live subscription.
    ///
    /// `db_path=None` (or blank) falls back to `ENTRYSYNC_DB_PATH`, then to
    /// the temp directory.
    #[flutter_rust_bridge::frb(sync)]
    pub fn open(db_path: Option<String>) -> Result<EntryScreenSession, String> {
        let config = match db_path.as_deref().map(str::trim) {
            Some(path) if !path.is_empty() => StoreConfig::file(path),
            _ => StoreConfig::from_env(),
        };
        let store = LocalStoreClient::open(&config).map_err(|err| {
            warn!("event=session_open module=ffi status=error error={}", err);
            format!("store open failed: {err}")
        })?;

        let notices = NoticeQueue::new();
        let mut screen = EntryScreen::new(Arc::new(store), notices.clone());
        screen.activate();
        info!("event=session_open module=ffi status=ok");

        Ok(Self {
            inner: Mutex::new(Some(SessionInner { screen, notices })),
        })
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn set_draft_text(&self, text: String) {
        self.with_inner(|inner| inner.screen.set_draft_text(text));
    }

    /// Submits the draft. Returns `false` when the draft was empty and
    /// nothing was written.
    #[flutter_rust_bridge::frb(sync)]
    pub fn submit(&self) -> bool {
        self.with_inner(|inner| inner.screen.submit() != SubmitOutcome::Ignored)
            .unwrap_or(false)
    }

    /// Starts editing a listed entry. Returns `false` for unknown ids.
    #[flutter_rust_bridge::frb(sync)]
    pub fn edit(&self, entry_id: String) -> bool {
        self.with_inner(|inner| inner.screen.request_edit_by_id(&EntryId::new(entry_id)))
            .unwrap_or(false)
    }

    #[flutter_rust_bridge::frb(sync)]
    pub fn delete(&self, entry_id: String) {
        self.with_inner(|inner| inner.screen.request_delete(&EntryId::new(entry_id)));
    }

    /// Applies queued store events and returns the current render state.
    #[flutter_rust_bridge::frb(sync)]
    pub fn poll(&self) -> ScreenSnapshot {
        self.with_inner(|inner| {
            inner.screen.process_pending();
            ScreenSnapshot::from(inner.screen.view())
        })
        .unwrap_or_else(|| ScreenSnapshot::from(render(&[], "", None)))
    }

    /// Drains toast messages produced since the last call.
    #[flutter_rust_bridge::frb(sync)]
    pub fn take_notices(&self) -> Vec<String> {
        self.with_inner(|inner| inner.notices.drain())
            .unwrap_or_default()
    }

    /// Tears the screen down and closes the store. Idempotent.
    #[flutter_rust_bridge::frb(sync)]
    pub fn close(&self) {
        if let Some(mut inner) = self.lock().take() {
            inner.screen.teardown();
            info!("event=session_close module=ffi status=ok");
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<SessionInner>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut SessionInner) -> T) -> Option<T> {
        let mut guard = self.lock();
        match guard.as_mut() {
            Some(inner) => Some(f(inner)),
            None => {
                warn!("event=session_call module=ffi status=skipped reason=closed");
                None
            }
        }
    }
}
