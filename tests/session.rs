//! Session lifecycle: debounced saves, restore, reset and store failures.

use stalk_analyzer::prelude::*;

const KEY: &str = "prices";

/// Store whose every operation fails
struct BrokenStore;

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> std::result::Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> std::result::Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&mut self, _key: &str) -> std::result::Result<(), StoreError> {
        Err(StoreError::Unavailable("quota exceeded".to_string()))
    }
}

fn memory_session() -> (Session<MemoryStore, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let session = Session::with_clock(MemoryStore::new(), SessionConfig::default(), clock.clone());
    (session, clock)
}

#[test]
fn test_only_last_edit_is_saved() {
    let (mut session, clock) = memory_session();

    session.on_series_edited(&["100"]);
    clock.advance_ms(200);
    session.on_series_edited(&["100", "90"]);
    clock.advance_ms(200);
    session.on_series_edited(&["100", "90", "80"]);

    // 500ms after the first edit, but only 100ms after the last
    clock.advance_ms(100);
    assert_eq!(session.poll(), None);
    assert_eq!(session.store().get(KEY).unwrap(), None);

    clock.advance_ms(400);
    assert_eq!(session.poll(), Some(Pattern::Unknown));
    assert_eq!(
        session.store().get(KEY).unwrap().as_deref(),
        Some("100,90,80,,,,,,,,,")
    );
    assert!(!session.is_save_pending());
}

#[test]
fn test_custom_debounce_interval() {
    let clock = ManualClock::new();
    let config = SessionConfig::default().with_debounce_ms(50);
    let mut session = Session::with_clock(MemoryStore::new(), config, clock.clone());

    session.on_series_edited(&["100", "90"]);
    clock.advance_ms(50);
    assert!(session.poll().is_some());
}

#[test]
fn test_resume_in_new_session() {
    let (mut first, _) = memory_session();
    let fields = [
        "100", "90", "95", "100", "105", "110", "", "", "", "", "", "",
    ];
    assert_eq!(first.on_series_edited(&fields), Pattern::SpikeSmall);
    first.flush();
    let store = first.into_store();

    let mut second = Session::with_clock(store, SessionConfig::default(), ManualClock::new());
    assert_eq!(second.restore(), Pattern::SpikeSmall);
    assert_eq!(second.view(), View::Ready(Pattern::SpikeSmall));
    assert!(!second.is_save_pending());
}

#[test]
fn test_reset_scenario() {
    let (mut session, _) = memory_session();
    session.on_series_edited(&["100", "90", "80", "70"]);
    session.flush();

    let pattern = session.on_reset();

    assert_eq!(session.store().get(KEY).unwrap(), None);
    assert!(session.series().iter().all(Option::is_none));
    assert_eq!(session.series().len(), SLOT_COUNT);
    assert_eq!(pattern, classify(&vec![None; SLOT_COUNT]));
    assert_eq!(session.view().text(), "???");
}

#[test]
fn test_broken_store_still_classifies() {
    let clock = ManualClock::new();
    let mut session = Session::with_clock(BrokenStore, SessionConfig::default(), clock.clone());

    assert_eq!(session.restore(), Pattern::Unknown);
    assert!(matches!(session.take_store_error(), Some(StoreError::Unavailable(_))));

    assert_eq!(session.on_series_edited(&["90", "95", "100", "105", "97"]), Pattern::SpikeBig);
    clock.advance_ms(500);
    assert_eq!(session.poll(), Some(Pattern::SpikeBig));
    assert_eq!(session.view(), View::Ready(Pattern::SpikeBig));
    assert!(session.take_store_error().is_some());
    assert!(session.take_store_error().is_none());

    // Failed save is not retried on its own
    clock.advance_ms(5_000);
    assert_eq!(session.poll(), None);

    assert_eq!(session.on_reset(), Pattern::Unknown);
    assert!(session.take_store_error().is_some());
}

#[test]
fn test_json_file_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.json");

    let mut session = Session::new(JsonFileStore::new(&path), SessionConfig::default());
    session.on_series_edited(&["100", "90", "80", "70", "60", "50", "45", "40", "35", "30", "25", "20"]);
    assert_eq!(session.flush(), Some(Pattern::Decreasing));

    let mut reopened = Session::new(JsonFileStore::new(&path), SessionConfig::default());
    assert_eq!(reopened.restore(), Pattern::Decreasing);
    assert_eq!(reopened.series(), session.series());

    reopened.on_reset();
    let mut again = Session::new(JsonFileStore::new(&path), SessionConfig::default());
    assert_eq!(again.restore(), Pattern::Unknown);
}

#[test]
fn test_storage_key_is_configurable() {
    let clock = ManualClock::new();
    let config = SessionConfig::default().with_storage_key("week-2");
    let mut session = Session::with_clock(MemoryStore::new(), config, clock);

    session.on_series_edited(&["100", "90"]);
    session.flush();
    assert!(session.store().get("week-2").unwrap().is_some());
    assert!(session.store().get(KEY).unwrap().is_none());
}
