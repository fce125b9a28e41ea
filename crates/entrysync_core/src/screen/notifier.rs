//! Transient user notices (toast collaborator).

use log::info;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

pub const NOTICE_SAVED: &str = "Entry saved.";
pub const NOTICE_UPDATED: &str = "Entry updated.";
pub const NOTICE_DELETED: &str = "Entry deleted.";

/// Receives one-shot messages meant for a transient notification.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Writes notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!("event=notice module=screen message={message}");
    }
}

/// Shared FIFO of notices drained by a presentation layer.
#[derive(Debug, Default, Clone)]
pub struct NoticeQueue {
    notices: Arc<Mutex<VecDeque<String>>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every queued notice, oldest first.
    pub fn drain(&self) -> Vec<String> {
        self.notices.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.notices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.lock().is_empty()
    }
}

impl Notifier for NoticeQueue {
    fn notify(&self, message: &str) {
        self.notices.lock().push_back(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::{LogNotifier, NoticeQueue, Notifier};

    #[test]
    fn queue_clones_share_notices_and_drain_in_order() {
        let queue = NoticeQueue::new();
        let presenter = queue.clone();
        queue.notify("first");
        queue.notify("second");

        assert_eq!(presenter.len(), 2);
        assert_eq!(presenter.drain(), vec!["first", "second"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn notifiers_are_usable_as_trait_objects() {
        let queue = NoticeQueue::new();
        let notifiers: Vec<Box<dyn Notifier>> =
            vec![Box::new(LogNotifier), Box::new(queue.clone())];
        for notifier in &notifiers {
            notifier.notify("Entry saved.");
        }
        assert_eq!(queue.drain(), vec!["Entry saved."]);
    }
}
