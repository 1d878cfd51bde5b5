//! # Durable Reactive Cell
//!
//! [`PersistedCell`] pairs an in-memory value with one durable slot. Everything
//! else in the crate (favorites, preferences) is built from cells.
//!
//! ## Guarantees
//!
//! - **Always valid**: the in-memory value is either a payload that passed the
//!   cell's [`Codec`] or the caller's default.
//! - **Load-or-default**: on open, an absent, unparsable or invalid slot yields the
//!   default. The bad slot is logged and left as it is, not overwritten.
//! - **Memory first**: `set`/`update` change the in-memory value unconditionally.
//!   The write-through that follows is best-effort; a failed write (quota, I/O) is
//!   logged and the value stays updated.
//! - **Observers see whole states**: each mutation notifies observers exactly once,
//!   after both the in-memory change and the durable write. `reset` clears the
//!   slot and restores the default before anyone is told.
//!
//! ## Cross-Context Sync
//!
//! A cell subscribes to its backend's change feed when it is opened. [`PersistedCell::sync`]
//! drains the feed: changes to this cell's key are decoded with the same codec and,
//! if valid, replace the in-memory value. Invalid payloads and removals are ignored.
//! There is no merging. The last change drained wins, whatever its causal order.
//!
//! ## Failure Semantics
//!
//! No method on a cell returns an error. Validation and storage failures are
//! recovered locally and reported through `tracing`.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::codec::{Codec, JsonCodec};
use crate::store::{ChangeFeed, StorageBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

type Observer<T> = Box<dyn FnMut(&T)>;

pub struct PersistedCell<T, B, C = JsonCodec<T>> {
    backend: Rc<B>,
    key: String,
    default: T,
    value: T,
    codec: C,
    feed: ChangeFeed,
    observers: Vec<(ObserverId, Observer<T>)>,
    next_observer: usize,
    persisted: bool,
}

impl<T, B, C> PersistedCell<T, B, C>
where
    T: Clone,
    B: StorageBackend,
    C: Codec<T>,
{
    /// Open the cell for `key`, materializing its value from storage or `default`.
    pub fn open(backend: Rc<B>, key: impl Into<String>, default: T, codec: C) -> Self {
        let key = key.into();
        // Subscribe before reading so no change can slip in between.
        let feed = backend.subscribe();
        let value = load(backend.as_ref(), &key, &codec).unwrap_or_else(|| default.clone());
        Self {
            backend,
            key,
            default,
            value,
            codec,
            feed,
            observers: Vec::new(),
            next_observer: 0,
            persisted: true,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> &T {
        &self.default
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Replace the value.
    pub fn set(&mut self, value: T) {
        self.value = value;
        self.write_through();
        self.notify();
    }

    /// Compute the next value from the current one.
    pub fn update(&mut self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.value);
        self.set(next);
    }

    /// Clear the slot and return to the default.
    pub fn reset(&mut self) {
        self.persisted = match self.backend.remove_slot(&self.key) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to clear persisted state");
                false
            }
        };
        self.value = self.default.clone();
        self.notify();
    }

    /// Apply pending changes made to this key by other contexts.
    ///
    /// Returns how many were applied.
    pub fn sync(&mut self) -> usize {
        let mut applied = 0;
        for change in self.feed.pending() {
            if change.key != self.key {
                continue;
            }
            let Some(raw) = change.new_value else {
                debug!(key = %self.key, "slot removed in another context, keeping current value");
                continue;
            };
            match self.codec.decode(&raw) {
                Ok(value) => {
                    debug!(key = %self.key, "applied change from another context");
                    self.value = value;
                    self.persisted = true;
                    applied += 1;
                    self.notify();
                }
                Err(e) => {
                    warn!(key = %self.key, error = %e, "ignoring invalid change from another context");
                }
            }
        }
        applied
    }

    /// Call `observer` with the new value after every mutation.
    pub fn subscribe(&mut self, observer: impl FnMut(&T) + 'static) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    /// Whether the last mutation reached storage. A cell that has not been
    /// mutated counts as persisted.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Byte length of the durable slot, 0 when absent or unreadable.
    pub fn persisted_len(&self) -> usize {
        self.backend.slot_len(&self.key).unwrap_or(0)
    }

    fn write_through(&mut self) {
        let raw = match self.codec.serialize(&self.value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to serialize state, not persisted");
                self.persisted = false;
                return;
            }
        };
        self.persisted = match self.backend.write_slot(&self.key, &raw) {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to persist state, keeping in-memory value");
                false
            }
        };
    }

    fn notify(&mut self) {
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.value);
        }
    }
}

fn load<T, B, C>(backend: &B, key: &str, codec: &C) -> Option<T>
where
    B: StorageBackend,
    C: Codec<T>,
{
    let raw = match backend.read_slot(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "failed to read persisted state, using default");
            return None;
        }
    };
    match codec.decode(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "invalid persisted state, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Validate;
    use crate::error::ValidationError;
    use crate::store::MemBackend;
    use serde::{Deserialize, Serialize};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tally {
        count: u32,
    }

    impl Validate for Tally {
        fn validate(&self) -> Result<(), ValidationError> {
            if self.count > 100 {
                return Err(ValidationError::new("count", "must be at most 100"));
            }
            Ok(())
        }
    }

    fn open(backend: &Rc<MemBackend>) -> PersistedCell<Tally, MemBackend> {
        PersistedCell::open(Rc::clone(backend), "tally", Tally { count: 0 }, JsonCodec::new())
    }

    #[test]
    fn test_absent_slot_yields_default() {
        let backend = Rc::new(MemBackend::new());
        let cell = open(&backend);
        assert_eq!(cell.get(), &Tally { count: 0 });
        assert_eq!(backend.read_slot("tally").unwrap(), None);
    }

    #[test]
    fn test_corrupt_slot_yields_default_and_is_left_alone() {
        let backend = Rc::new(MemBackend::new());
        backend.seed_slot("tally", "{not json");

        let cell = open(&backend);
        assert_eq!(cell.get(), &Tally { count: 0 });
        assert_eq!(
            backend.read_slot("tally").unwrap(),
            Some("{not json".to_string())
        );
    }

    #[test]
    fn test_invalid_slot_yields_default() {
        let backend = Rc::new(MemBackend::new());
        backend.seed_slot("tally", r#"{"count":500}"#);
        assert_eq!(open(&backend).get(), &Tally { count: 0 });
    }

    #[test]
    fn test_set_persists_for_the_next_open() {
        let backend = Rc::new(MemBackend::new());
        let mut cell = open(&backend);
        cell.set(Tally { count: 7 });

        assert_eq!(open(&backend).get(), &Tally { count: 7 });
    }

    #[test]
    fn test_update_sees_latest_value() {
        let backend = Rc::new(MemBackend::new());
        let mut cell = open(&backend);
        cell.update(|t| Tally { count: t.count + 1 });
        cell.update(|t| Tally { count: t.count + 1 });
        assert_eq!(cell.get().count, 2);
    }

    #[test]
    fn test_write_failure_keeps_in_memory_value() {
        let backend = Rc::new(MemBackend::new());
        let mut cell = open(&backend);
        backend.set_simulate_write_error(true);

        cell.set(Tally { count: 9 });
        assert_eq!(cell.get().count, 9);
        assert_eq!(backend.read_slot("tally").unwrap(), None);
        assert!(!cell.is_persisted());

        backend.set_simulate_write_error(false);
        cell.set(Tally { count: 10 });
        assert!(cell.is_persisted());
    }

    #[test]
    fn test_reset_clears_slot_and_notifies_once_with_default() {
        let backend = Rc::new(MemBackend::new());
        let mut cell = open(&backend);
        cell.set(Tally { count: 4 });

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        cell.subscribe(move |t: &Tally| sink.borrow_mut().push(t.count));

        cell.reset();
        assert_eq!(cell.get().count, 0);
        assert_eq!(backend.read_slot("tally").unwrap(), None);
        assert_eq!(*seen.borrow(), vec![0]);
    }

    #[test]
    fn test_sync_applies_valid_changes_from_other_context() {
        let tab_a = Rc::new(MemBackend::new());
        let tab_b = Rc::new(tab_a.open_context());
        let mut cell_a = open(&tab_a);
        let mut cell_b = open(&tab_b);

        cell_a.set(Tally { count: 3 });
        cell_a.set(Tally { count: 5 });

        assert_eq!(cell_b.sync(), 2);
        assert_eq!(cell_b.get().count, 5);
        // No self-notification.
        assert_eq!(cell_a.sync(), 0);
    }

    #[test]
    fn test_sync_ignores_invalid_payloads_and_removals() {
        let tab_a = Rc::new(MemBackend::new());
        let tab_b = Rc::new(tab_a.open_context());
        let mut cell_b = open(&tab_b);
        cell_b.set(Tally { count: 2 });

        tab_a.write_slot("tally", r#"{"count":1000}"#).unwrap();
        tab_a.write_slot("tally", "garbage").unwrap();
        tab_a.remove_slot("tally").unwrap();
        tab_a.write_slot("other", r#"{"count":1}"#).unwrap();

        assert_eq!(cell_b.sync(), 0);
        assert_eq!(cell_b.get().count, 2);
    }

    #[test]
    fn test_observers_can_unsubscribe() {
        let backend = Rc::new(MemBackend::new());
        let mut cell = open(&backend);
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);
        let id = cell.subscribe(move |_| *counter.borrow_mut() += 1);

        cell.set(Tally { count: 1 });
        assert!(cell.unsubscribe(id));
        cell.set(Tally { count: 2 });

        assert_eq!(*calls.borrow(), 1);
        assert!(!cell.unsubscribe(id));
    }

    #[test]
    fn test_persisted_len_tracks_slot() {
        let backend = Rc::new(MemBackend::new());
        let mut cell = open(&backend);
        assert_eq!(cell.persisted_len(), 0);
        cell.set(Tally { count: 1 });
        assert_eq!(cell.persisted_len(), r#"{"count":1}"#.len());
    }
}
