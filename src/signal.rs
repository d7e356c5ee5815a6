//! Focus-change event streams.
//!
//! A `FocusSignal` is a synchronous publish/subscribe channel: `emit` runs
//! every connected callback on the calling thread before returning. The
//! callback list is snapshotted before delivery, so a callback may connect
//! or disconnect without deadlocking the signal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::types::{AttentionValue, Handle};

/// An item crossed the attentional focus boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusEvent {
    pub handle: Handle,
    pub old: AttentionValue,
    pub new: AttentionValue,
}

/// Identifies one connected callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

type Slot = Arc<dyn Fn(&FocusEvent) + Send + Sync>;

/// One event stream with any number of subscribers.
pub struct FocusSignal {
    slots: RwLock<Vec<(ConnectionId, Slot)>>,
    next_id: AtomicU64,
}

impl FocusSignal {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Attach a callback. It runs for every event emitted after this returns.
    pub fn connect<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn(&FocusEvent) + Send + Sync + 'static,
    {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(callback)));
        id
    }

    /// Detach a callback. Returns false if it was not connected.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let before = slots.len();
        slots.retain(|(slot_id, _)| *slot_id != id);
        slots.len() != before
    }

    /// Deliver an event to every subscriber, in connection order.
    pub fn emit(&self, event: &FocusEvent) {
        let snapshot: Vec<Slot> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, slot)| Arc::clone(slot))
            .collect();
        for slot in snapshot {
            slot(event);
        }
    }

    /// Number of connected callbacks.
    pub fn len(&self) -> usize {
        self.slots.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FocusSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FocusSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FocusSignal")
            .field("subscribers", &self.len())
            .finish()
    }
}
