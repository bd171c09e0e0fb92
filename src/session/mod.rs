//! Session controller
//!
//! Owns the live week of samples, the backing store and the debounced save.
//!
//! - Edits classify right away and (re)schedule a save; nothing touches the
//!   store until [`Session::poll`] sees the debounce window elapse.
//! - Restore and reset take effect immediately and never schedule a save.
//! - Store failures are logged and remembered, never returned. The session
//!   keeps answering from memory.
//!
//! The session is single-threaded: the host calls `poll` from its own event
//! loop, the way a UI toolkit runs timers between input events.

mod clock;
mod debounce;

pub use clock::{Clock, ManualClock, SystemClock};
pub use debounce::{Debouncer, Ticket};

use std::fmt;

use crate::codec;
use crate::config::SessionConfig;
use crate::normalizer::{normalize, normalize_value};
use crate::store::{KeyValueStore, StoreError};
use crate::{Analysis, Classifier, Pattern, PriceSample, Slot, SLOT_COUNT};

/// What the result display shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// An edit is waiting out the debounce window
    Pending,
    Ready(Pattern),
}

impl View {
    pub fn text(self) -> &'static str {
        match self {
            View::Pending => "...",
            View::Ready(pattern) => pattern.label(),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

pub struct Session<S: KeyValueStore, C: Clock = SystemClock> {
    config: SessionConfig,
    store: S,
    clock: C,
    classifier: Classifier,
    series: Vec<PriceSample>,
    save: Debouncer<Vec<PriceSample>>,
    view: View,
    store_error: Option<StoreError>,
}

impl<S: KeyValueStore> Session<S, SystemClock> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> Session<S, C> {
    pub fn with_clock(store: S, config: SessionConfig, clock: C) -> Self {
        let series = vec![None; SLOT_COUNT];
        let classifier = Classifier::default();
        let view = View::Ready(classifier.classify(&series));
        Self {
            save: Debouncer::new(config.debounce()),
            config,
            store,
            clock,
            classifier,
            series,
            view,
            store_error: None,
        }
    }

    /// Use a custom classifier. The current view is re-evaluated.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        if let View::Ready(_) = self.view {
            self.view = View::Ready(self.pattern());
        }
        self
    }

    // ===========================================
    // Accessors
    // ===========================================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Live samples, one per slot
    pub fn series(&self) -> &[PriceSample] {
        &self.series
    }

    pub fn sample(&self, slot: Slot) -> PriceSample {
        self.series[slot.index()]
    }

    /// Classification of the live series
    pub fn pattern(&self) -> Pattern {
        self.classifier.classify(&self.series)
    }

    pub fn analysis(&self) -> Analysis {
        self.classifier.analyze(&self.series)
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn is_save_pending(&self) -> bool {
        self.save.is_pending()
    }

    /// Last store failure, if any, clearing it
    pub fn take_store_error(&mut self) -> Option<StoreError> {
        self.store_error.take()
    }

    // ===========================================
    // Events
    // ===========================================

    /// All fields were edited. Fields past the last slot are ignored and
    /// missing ones are unset.
    pub fn on_series_edited<T: AsRef<str>>(&mut self, raw: &[T]) -> Pattern {
        if raw.len() > SLOT_COUNT {
            tracing::debug!(fields = raw.len(), "ignoring fields past the last slot");
        }
        let mut series = normalize(&raw[..raw.len().min(SLOT_COUNT)]);
        series.resize(SLOT_COUNT, None);
        self.series = series;
        self.edited()
    }

    /// A single field was edited
    pub fn on_slot_edited(&mut self, slot: Slot, raw: &str) -> Pattern {
        self.series[slot.index()] = normalize_value(raw);
        self.edited()
    }

    /// Load a persisted series and classify it without saving.
    ///
    /// A non-blank value replaces the live series and drops any pending save.
    /// A blank value leaves the live series, its pending save and the view
    /// as they are.
    pub fn on_restore(&mut self, persisted: &str) -> Pattern {
        if persisted.trim().is_empty() {
            return self.pattern();
        }
        if self.save.cancel().is_some() {
            tracing::debug!("pending save dropped by restore");
        }
        self.series = codec::parse_slots(persisted);
        let pattern = self.pattern();
        tracing::debug!(pattern = pattern.id(), "restored");
        self.view = View::Ready(pattern);
        pattern
    }

    /// Read the configured key from the store and restore it
    pub fn restore(&mut self) -> Pattern {
        match self.store.get(&self.config.storage_key) {
            Ok(Some(persisted)) => self.on_restore(&persisted),
            Ok(None) => self.on_restore(""),
            Err(e) => {
                self.record_store_error("restore", e);
                self.on_restore("")
            }
        }
    }

    /// Clear the persisted entry and every field. A pending save is dropped
    /// so it cannot write the old series back.
    pub fn on_reset(&mut self) -> Pattern {
        if self.save.cancel().is_some() {
            tracing::debug!("pending save dropped by reset");
        }
        if let Err(e) = self.store.remove(&self.config.storage_key) {
            self.record_store_error("reset", e);
        }
        self.series = vec![None; SLOT_COUNT];
        let pattern = self.pattern();
        self.view = View::Ready(pattern);
        pattern
    }

    /// Run the pending save if its window has elapsed. Returns the pattern of
    /// the saved series.
    pub fn poll(&mut self) -> Option<Pattern> {
        let series = self.save.poll(self.clock.now())?;
        Some(self.persist(series))
    }

    /// Run the pending save now
    pub fn flush(&mut self) -> Option<Pattern> {
        let series = self.save.cancel()?;
        Some(self.persist(series))
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn edited(&mut self) -> Pattern {
        let ticket = self.save.schedule(self.clock.now(), self.series.clone());
        tracing::debug!(ticket = ?ticket, delay_ms = self.config.debounce_ms, "save scheduled");
        self.view = View::Pending;
        self.pattern()
    }

    fn persist(&mut self, series: Vec<PriceSample>) -> Pattern {
        let pattern = self.classifier.classify(&series);
        let encoded = codec::serialize(&series);
        match self.store.set(&self.config.storage_key, &encoded) {
            Ok(()) => tracing::debug!(key = %self.config.storage_key, %encoded, "series saved"),
            Err(e) => self.record_store_error("save", e),
        }
        self.view = View::Ready(pattern);
        pattern
    }

    fn record_store_error(&mut self, action: &'static str, error: StoreError) {
        tracing::warn!(action, error = %error, "store unavailable, continuing in memory");
        self.store_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const KEY: &str = "prices";

    fn session() -> (Session<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let session =
            Session::with_clock(MemoryStore::new(), SessionConfig::default(), clock.clone());
        (session, clock)
    }

    #[test]
    fn test_fresh_session() {
        let (session, _) = session();
        assert_eq!(session.series().len(), SLOT_COUNT);
        assert!(session.series().iter().all(Option::is_none));
        assert_eq!(session.view(), View::Ready(Pattern::Unknown));
        assert!(!session.is_save_pending());
    }

    #[test]
    fn test_edit_classifies_and_defers_save() {
        let (mut session, clock) = session();
        let pattern = session.on_series_edited(&["90", "95", "100", "105", "97"]);
        assert_eq!(pattern, Pattern::SpikeBig);
        assert_eq!(session.view(), View::Pending);
        assert_eq!(session.view().text(), "...");
        assert!(session.is_save_pending());

        clock.advance_ms(499);
        assert_eq!(session.poll(), None);
        assert_eq!(session.store().get(KEY).unwrap(), None);

        clock.advance_ms(1);
        assert_eq!(session.poll(), Some(Pattern::SpikeBig));
        assert_eq!(session.view(), View::Ready(Pattern::SpikeBig));
        assert_eq!(
            session.store().get(KEY).unwrap().as_deref(),
            Some("90,95,100,105,97,,,,,,,")
        );
    }

    #[test]
    fn test_slot_edit() {
        let (mut session, _) = session();
        session.on_series_edited(&["100", "90"]);
        let slot: Slot = "day2am".parse().unwrap();
        assert_eq!(session.on_slot_edited(slot, "80"), Pattern::Unknown);
        assert_eq!(session.sample(slot).map(|p| p.get()), Some(80.0));
        assert!(session.is_save_pending());
    }

    #[test]
    fn test_extra_fields_ignored() {
        let (mut session, _) = session();
        let raw: Vec<String> = (0..15).map(|i| (200 - i * 10).to_string()).collect();
        assert_eq!(session.on_series_edited(&raw), Pattern::Decreasing);
        assert_eq!(session.series().len(), SLOT_COUNT);
    }

    #[test]
    fn test_flush_saves_now() {
        let (mut session, _) = session();
        session.on_series_edited(&["100", "90", "80", "70"]);
        assert_eq!(session.flush(), Some(Pattern::Unknown));
        assert!(session.store().get(KEY).unwrap().is_some());
        assert_eq!(session.flush(), None);
    }

    #[test]
    fn test_restore_does_not_save() {
        let mut store = MemoryStore::new();
        store.set(KEY, "100,90,80,70").unwrap();
        let mut session = Session::with_clock(store, SessionConfig::default(), ManualClock::new());

        assert_eq!(session.restore(), Pattern::Unknown);
        assert!(!session.is_save_pending());
        assert_eq!(session.view(), View::Ready(Pattern::Unknown));
        assert_eq!(session.series()[3].map(|p| p.get()), Some(70.0));
    }

    #[test]
    fn test_restore_empty_store() {
        let (mut session, _) = session();
        assert_eq!(session.restore(), Pattern::Unknown);
        assert!(session.series().iter().all(Option::is_none));
    }

    #[test]
    fn test_blank_restore_keeps_pending_save() {
        let (mut session, clock) = session();
        session.on_series_edited(&["90", "95", "100", "105", "97"]);

        assert_eq!(session.restore(), Pattern::SpikeBig);
        assert!(session.is_save_pending());
        assert_eq!(session.view(), View::Pending);

        clock.advance_ms(500);
        assert_eq!(session.poll(), Some(Pattern::SpikeBig));
        assert_eq!(
            session.store().get(KEY).unwrap().as_deref(),
            Some("90,95,100,105,97,,,,,,,")
        );
    }

    #[test]
    fn test_restore_replaces_pending_edit() {
        let mut store = MemoryStore::new();
        store.set(KEY, "100,90,80,70").unwrap();
        let clock = ManualClock::new();
        let mut session = Session::with_clock(store, SessionConfig::default(), clock.clone());
        session.on_series_edited(&["90", "95", "100", "105", "97"]);

        assert_eq!(session.restore(), Pattern::Unknown);
        assert!(!session.is_save_pending());

        clock.advance_ms(1_000);
        assert_eq!(session.poll(), None);
        assert_eq!(session.store().get(KEY).unwrap().as_deref(), Some("100,90,80,70"));
    }

    #[test]
    fn test_reset_cancels_pending_save() {
        let (mut session, clock) = session();
        session.on_series_edited(&["100", "90"]);
        session.flush();
        session.on_series_edited(&["100", "110"]);

        assert_eq!(session.on_reset(), Pattern::Unknown);
        assert!(!session.is_save_pending());
        assert_eq!(session.store().get(KEY).unwrap(), None);

        clock.advance_ms(1_000);
        assert_eq!(session.poll(), None);
        assert_eq!(session.store().get(KEY).unwrap(), None);
    }

    #[test]
    fn test_custom_classifier() {
        let classifier = Classifier::builder().fallback(Pattern::Random).build().unwrap();
        let (session, _) = session();
        let session = session.with_classifier(classifier);
        assert_eq!(session.view(), View::Ready(Pattern::Random));
    }

    #[test]
    fn test_view_display() {
        assert_eq!(View::Pending.to_string(), "...");
        assert_eq!(View::Ready(Pattern::SpikeSmall).to_string(), "Small Spike Pattern");
    }
}
