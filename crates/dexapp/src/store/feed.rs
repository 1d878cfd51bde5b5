//! Cross-context change notifications.
//!
//! A [`ChangeHub`] is shared by every backend handle opened on the same origin.
//! Each handle is an execution context with its own [`ContextId`]. When a context
//! writes or removes a slot, the hub forwards a [`SlotChange`] to the feeds of all
//! *other* contexts. A context never hears about its own writes.

use std::cell::{Cell, RefCell};
use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

/// A slot changed in another context. `new_value` is `None` when it was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    pub key: String,
    pub new_value: Option<String>,
}

#[derive(Default)]
pub struct ChangeHub {
    next_context: Cell<u64>,
    subscribers: RefCell<Vec<(ContextId, Sender<SlotChange>)>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_context(&self) -> ContextId {
        let id = self.next_context.get();
        self.next_context.set(id + 1);
        ContextId(id)
    }

    pub fn subscribe(&self, context: ContextId) -> ChangeFeed {
        let (tx, rx) = channel();
        self.subscribers.borrow_mut().push((context, tx));
        ChangeFeed { rx }
    }

    /// Deliver `change` to every feed not owned by `from`. Dropped feeds are pruned.
    pub fn publish(&self, from: ContextId, change: SlotChange) {
        self.subscribers.borrow_mut().retain(|(context, tx)| {
            if *context == from {
                return true;
            }
            tx.send(change.clone()).is_ok()
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }
}

/// Inbound notifications for one subscriber.
pub struct ChangeFeed {
    rx: Receiver<SlotChange>,
}

impl ChangeFeed {
    /// Everything delivered so far, oldest first. Never blocks.
    pub fn pending(&self) -> Vec<SlotChange> {
        self.rx.try_iter().collect()
    }
}
