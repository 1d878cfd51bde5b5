use super::backend::{check_quota, StorageBackend};
use super::feed::{ChangeFeed, ChangeHub, ContextId, SlotChange};
use crate::error::{DexError, Result};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Default)]
struct MemOrigin {
    slots: RefCell<BTreeMap<String, String>>,
    hub: ChangeHub,
    quota: Cell<Option<usize>>,
}

/// In-memory storage backend.
///
/// Uses `RefCell` for interior mutability since the state layer is single-threaded.
/// Every handle returned by [`MemBackend::open_context`] shares the same slots
/// and hub, standing in for another browser tab on the same origin.
pub struct MemBackend {
    origin: Rc<MemOrigin>,
    context: ContextId,
    simulate_write_error: Cell<bool>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self::attach(Rc::new(MemOrigin::default()))
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the origin to `bytes` (sum of key and value lengths over all slots).
    pub fn with_quota(self, bytes: usize) -> Self {
        self.origin.quota.set(Some(bytes));
        self
    }

    fn attach(origin: Rc<MemOrigin>) -> Self {
        let context = origin.hub.new_context();
        Self {
            origin,
            context,
            simulate_write_error: Cell::new(false),
        }
    }

    /// Another execution context on the same origin.
    pub fn open_context(&self) -> Self {
        Self::attach(Rc::clone(&self.origin))
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.set(simulate);
    }

    /// Write a slot without announcing it, as if edited outside any context.
    pub fn seed_slot(&self, key: &str, value: &str) {
        self.origin
            .slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn footprint_without(&self, key: &str) -> usize {
        self.origin
            .slots
            .borrow()
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl StorageBackend for MemBackend {
    fn read_slot(&self, key: &str) -> Result<Option<String>> {
        Ok(self.origin.slots.borrow().get(key).cloned())
    }

    fn write_slot(&self, key: &str, value: &str) -> Result<()> {
        if self.simulate_write_error.get() {
            return Err(DexError::Store("Simulated write error".to_string()));
        }
        check_quota(
            key,
            value,
            self.footprint_without(key),
            self.origin.quota.get(),
        )?;

        self.origin
            .slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.origin.hub.publish(
            self.context,
            SlotChange {
                key: key.to_string(),
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn remove_slot(&self, key: &str) -> Result<()> {
        let removed = self.origin.slots.borrow_mut().remove(key);
        if removed.is_some() {
            self.origin.hub.publish(
                self.context,
                SlotChange {
                    key: key.to_string(),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.origin.slots.borrow().keys().cloned().collect())
    }

    fn subscribe(&self) -> ChangeFeed {
        self.origin.hub.subscribe(self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_io() {
        let backend = MemBackend::new();
        assert_eq!(backend.read_slot("k").unwrap(), None);

        backend.write_slot("k", "v").unwrap();
        assert_eq!(backend.read_slot("k").unwrap(), Some("v".to_string()));
        assert_eq!(backend.slot_len("k").unwrap(), 1);

        backend.remove_slot("k").unwrap();
        assert_eq!(backend.read_slot("k").unwrap(), None);
        backend.remove_slot("k").unwrap();
    }

    #[test]
    fn test_contexts_share_slots_and_notify_each_other() {
        let tab_a = MemBackend::new();
        let tab_b = tab_a.open_context();
        let feed_a = tab_a.subscribe();
        let feed_b = tab_b.subscribe();

        tab_a.write_slot("k", "from-a").unwrap();

        assert_eq!(tab_b.read_slot("k").unwrap(), Some("from-a".to_string()));
        assert!(feed_a.pending().is_empty());
        let changes = feed_b.pending();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_value.as_deref(), Some("from-a"));
    }

    #[test]
    fn test_removal_is_announced_once() {
        let tab_a = MemBackend::new();
        let tab_b = tab_a.open_context();
        let feed_b = tab_b.subscribe();

        tab_a.write_slot("k", "v").unwrap();
        tab_a.remove_slot("k").unwrap();
        tab_a.remove_slot("k").unwrap();

        let changes = feed_b.pending();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[1].new_value, None);
    }

    #[test]
    fn test_quota_rejects_oversized_writes() {
        let backend = MemBackend::new().with_quota(10);
        backend.write_slot("ab", "12345").unwrap();

        let err = backend.write_slot("cd", "12345").unwrap_err();
        assert!(matches!(err, DexError::QuotaExceeded { needed: 14, limit: 10, .. }));

        // Rewriting an existing slot only counts its new size.
        backend.write_slot("ab", "12345678").unwrap();
    }

    #[test]
    fn test_simulated_write_error() {
        let backend = MemBackend::new();
        backend.set_simulate_write_error(true);
        assert!(backend.write_slot("k", "v").is_err());
        assert_eq!(backend.read_slot("k").unwrap(), None);
    }

    #[test]
    fn test_seed_slot_is_silent() {
        let tab_a = MemBackend::new();
        let tab_b = tab_a.open_context();
        let feed_b = tab_b.subscribe();

        tab_a.seed_slot("k", "v");
        assert!(feed_b.pending().is_empty());
        assert_eq!(tab_b.keys().unwrap(), vec!["k".to_string()]);
    }
}
