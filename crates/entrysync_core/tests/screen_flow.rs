use entrysync_core::{
    EntryScreen, LocalStoreClient, NoticeQueue, RemoteStoreClient, StoreConfig, SubmitLabel,
    SubmitOutcome, SubscriptionState,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn open_screen() -> (
    Arc<LocalStoreClient>,
    EntryScreen<LocalStoreClient>,
    NoticeQueue,
) {
    let store = Arc::new(LocalStoreClient::open(&StoreConfig::in_memory()).unwrap());
    let notices = NoticeQueue::new();
    let mut screen = EntryScreen::new(Arc::clone(&store), notices.clone());
    screen.activate();
    (store, screen, notices)
}

fn pump_until<C, F>(screen: &mut EntryScreen<C>, mut done: F)
where
    C: RemoteStoreClient + ?Sized,
    F: FnMut(&EntryScreen<C>) -> bool,
{
    let deadline = Instant::now() + WAIT;
    while !done(screen) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        assert!(
            !remaining.is_zero(),
            "screen did not reach expected state in time"
        );
        screen.wait_for_event(remaining);
    }
}

fn contents<C: RemoteStoreClient + ?Sized>(screen: &EntryScreen<C>) -> Vec<String> {
    screen
        .entries()
        .iter()
        .map(|entry| entry.content.clone())
        .collect()
}

#[test]
fn create_edit_delete_scenario() {
    let (_store, mut screen, notices) = open_screen();
    assert!(screen.wait_for_event(WAIT), "initial snapshot expected");

    screen.set_draft_text("buy milk");
    assert_eq!(screen.submit(), SubmitOutcome::Created);
    assert_eq!(screen.view().draft_text, "");
    pump_until(&mut screen, |s| contents(s) == vec!["buy milk"]);

    let entry = screen.entries()[0].clone();
    screen.request_edit(&entry);
    let view = screen.view();
    assert_eq!(view.draft_text, "buy milk");
    assert_eq!(view.submit_label, SubmitLabel::Update);

    screen.set_draft_text("buy milk and eggs");
    assert_eq!(screen.submit(), SubmitOutcome::Updated(entry.id.clone()));
    assert!(!screen.view().is_editing);
    pump_until(&mut screen, |s| contents(s) == vec!["buy milk and eggs"]);
    assert_eq!(screen.entries()[0].id, entry.id);

    screen.request_delete(&entry.id);
    pump_until(&mut screen, |s| s.entries().is_empty());
    assert!(screen.view().empty_message.is_some());

    pump_until(&mut screen, |_| notices.len() >= 3);
    assert_eq!(
        notices.drain(),
        vec!["Entry saved.", "Entry updated.", "Entry deleted."]
    );
}

#[test]
fn empty_submit_issues_no_write() {
    let (store, mut screen, notices) = open_screen();

    assert!(screen.wait_for_event(WAIT), "initial snapshot expected");

    assert_eq!(screen.submit(), SubmitOutcome::Ignored);
    assert!(!screen.wait_for_event(Duration::from_millis(200)));

    assert!(screen.entries().is_empty());
    assert!(notices.is_empty());
    assert_eq!(store.listener_count(), 1);
}

#[test]
fn failed_update_clears_form_and_reports_once() {
    let (_store, mut screen, notices) = open_screen();
    screen.set_draft_text("buy milk");
    screen.submit();
    pump_until(&mut screen, |s| s.entries().len() == 1);
    let entry = screen.entries()[0].clone();

    screen.request_edit(&entry);
    screen.request_delete(&entry.id);
    pump_until(&mut screen, |s| s.entries().is_empty());

    // Orphaned edit state survives the delete.
    assert!(screen.view().is_editing);
    assert_eq!(screen.form().draft_text(), "buy milk");

    screen.set_draft_text("buy oat milk");
    assert_eq!(screen.submit(), SubmitOutcome::Updated(entry.id.clone()));
    assert_eq!(screen.form().draft_text(), "");
    assert!(!screen.form().is_editing());

    pump_until(&mut screen, |_| notices.len() >= 3);
    let drained = notices.drain();
    assert_eq!(drained[0], "Entry saved.");
    assert_eq!(drained[1], "Entry deleted.");
    assert!(drained[2].starts_with("Failed to update entry: document not found"));
}

#[test]
fn listener_interruption_keeps_list_until_restored() {
    let (store, mut screen, notices) = open_screen();
    screen.set_draft_text("buy milk");
    screen.submit();
    pump_until(&mut screen, |s| s.entries().len() == 1);
    pump_until(&mut screen, |_| notices.len() >= 1);
    notices.drain();

    store.set_reachable(false);
    pump_until(&mut screen, |_| !notices.is_empty());
    assert!(notices.drain()[0].starts_with("Failed to load entries:"));
    assert_eq!(contents(&screen), vec!["buy milk"]);

    screen.set_draft_text("while offline");
    screen.submit();
    pump_until(&mut screen, |_| !notices.is_empty());
    assert!(notices.drain()[0].starts_with("Failed to save entry: store unavailable"));
    assert_eq!(contents(&screen), vec!["buy milk"]);

    store.set_reachable(true);
    screen.set_draft_text("back online");
    screen.submit();
    pump_until(&mut screen, |s| s.entries().len() == 2);
    assert_eq!(contents(&screen), vec!["buy milk", "back online"]);
}

#[test]
fn teardown_stops_all_callbacks() {
    let (store, mut screen, _notices) = open_screen();
    assert!(screen.wait_for_event(WAIT), "initial snapshot expected");
    screen.teardown();

    assert_eq!(screen.subscription_state(), SubscriptionState::Unsubscribed);
    assert_eq!(store.listener_count(), 0);

    let (callback, handle) = entrysync_core::pending();
    store.create("after teardown", callback);
    handle.wait_timeout(WAIT).unwrap().unwrap();
    store.set_reachable(false);

    assert!(!screen.wait_for_event(Duration::from_millis(200)));
    assert!(screen.entries().is_empty());
}

#[test]
fn reactivation_keeps_a_single_listener() {
    let (store, mut screen, _notices) = open_screen();
    screen.activate();
    screen.activate();
    assert_eq!(store.listener_count(), 1);

    drop(screen);
    assert_eq!(store.listener_count(), 0);
}

#[test]
fn two_screens_see_each_others_writes() {
    let store = Arc::new(LocalStoreClient::open(&StoreConfig::in_memory()).unwrap());
    let mut first = EntryScreen::new(Arc::clone(&store), NoticeQueue::new());
    let mut second = EntryScreen::new(Arc::clone(&store), NoticeQueue::new());
    first.activate();
    second.activate();

    first.set_draft_text("shared note");
    first.submit();

    pump_until(&mut second, |s| contents(s) == vec!["shared note"]);
    pump_until(&mut first, |s| contents(s) == vec!["shared note"]);
}
