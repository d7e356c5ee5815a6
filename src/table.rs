use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use crate::error::{AttentionBankError, Result};
use crate::types::{AttentionValue, Currency, Handle};

/// Receives every committed importance change from an item table.
pub trait ValueChangeListener: Send + Sync {
    /// Called exactly once per committed mutation, with `old` being the value
    /// immediately before it. Calls for one item arrive in commit order.
    fn on_value_changed(&self, handle: Handle, old: &AttentionValue, new: &AttentionValue);
}

/// Identifies one listener registration on a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// The external store that owns each item's importance value.
///
/// The bank never writes values itself. It asks the table for credits and
/// learns about every change, its own or anyone else's, through the
/// listener it registered.
pub trait ItemTable: Send + Sync {
    /// Current value of an item, if the table knows it.
    fn value(&self, handle: Handle) -> Option<AttentionValue>;

    /// Add `amount` to one currency of an item and notify listeners.
    ///
    /// Fails with `UnknownItem` if the handle is not in the table, in which
    /// case nothing is committed and nobody is notified.
    fn request_credit(&self, handle: Handle, currency: Currency, amount: i64) -> Result<()>;

    /// Register a listener. The table holds it weakly.
    fn subscribe(&self, listener: Weak<dyn ValueChangeListener>) -> SubscriptionId;

    /// Remove a registration. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

/// In-memory item table.
///
/// A commit holds the item lock only while it swaps the value. Delivery of
/// the change runs after that lock is released but under a separate
/// delivery lock taken before the commit, so listeners see every change in
/// commit order and may read the table (or anything a focus subscriber
/// reaches from there) while handling it. Writes back into the same table
/// from inside a notification, including `AttentionBank::stimulate`, would
/// wait on the delivery lock and must be deferred by the caller.
pub struct MemoryTable {
    items: Mutex<HashMap<Handle, AttentionValue>>,
    delivery: Mutex<()>,
    listeners: RwLock<Vec<(SubscriptionId, Weak<dyn ValueChangeListener>)>>,
    next_subscription: AtomicU64,
}

/// A committed change waiting to be delivered.
type Change = (Handle, AttentionValue, AttentionValue);

impl MemoryTable {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            delivery: Mutex::new(()),
            listeners: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// Add an item. A non-zero initial value is reported to listeners as a
    /// change from the zero value, so the banks pay for it.
    ///
    /// Returns false, changing nothing, if the handle already exists.
    pub fn insert(&self, handle: Handle, value: AttentionValue) -> bool {
        self.commit(|items| {
            if items.contains_key(&handle) {
                return (false, None);
            }
            items.insert(handle, value);
            (true, Some((handle, AttentionValue::default(), value)))
        })
    }

    /// Overwrite an item's value directly, returning the previous value.
    pub fn set_value(&self, handle: Handle, value: AttentionValue) -> Result<AttentionValue> {
        self.commit(|items| match items.get_mut(&handle) {
            Some(slot) => {
                let old = std::mem::replace(slot, value);
                (Ok(old), Some((handle, old, value)))
            }
            None => (Err(AttentionBankError::UnknownItem { handle }), None),
        })
    }

    /// Remove an item. Its importance is first zeroed through a change
    /// notification so it flows back to the funds.
    pub fn remove(&self, handle: Handle) -> Option<AttentionValue> {
        self.commit(|items| match items.remove(&handle) {
            Some(old) => (Some(old), Some((handle, old, AttentionValue::default()))),
            None => (None, None),
        })
    }

    /// Sum of one currency over every item. O(n).
    pub fn total(&self, currency: Currency) -> i64 {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|v| v.get(currency))
            .sum()
    }

    /// All handles currently in the table.
    pub fn handles(&self) -> Vec<Handle> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of live listener registrations.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, l)| l.strong_count() > 0)
            .count()
    }

    /// Apply `mutate` under the item lock, then deliver the change it
    /// reports with only the delivery lock held. No-op changes are dropped.
    fn commit<R>(
        &self,
        mutate: impl FnOnce(&mut HashMap<Handle, AttentionValue>) -> (R, Option<Change>),
    ) -> R {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let (result, change) = {
            let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
            mutate(&mut items)
        };
        if let Some((handle, old, new)) = change {
            if old != new {
                self.notify(handle, &old, &new);
            }
        }
        result
    }

    fn notify(&self, handle: Handle, old: &AttentionValue, new: &AttentionValue) {
        let live: Vec<Arc<dyn ValueChangeListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|(_, l)| l.upgrade())
            .collect();
        for listener in live {
            listener.on_value_changed(handle, old, new);
        }
    }
}

impl ItemTable for MemoryTable {
    fn value(&self, handle: Handle) -> Option<AttentionValue> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle)
            .copied()
    }

    fn request_credit(&self, handle: Handle, currency: Currency, amount: i64) -> Result<()> {
        self.commit(|items| match items.get_mut(&handle) {
            Some(slot) => {
                let old = *slot;
                *slot = old.credited(currency, amount);
                (Ok(()), Some((handle, old, *slot)))
            }
            None => (Err(AttentionBankError::UnknownItem { handle }), None),
        })
    }

    fn subscribe(&self, listener: Weak<dyn ValueChangeListener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|(_, l)| l.strong_count() > 0);
        listeners.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(sub, _)| *sub != id);
    }
}

impl Default for MemoryTable {
    fn default() -> Self {
        Self::new()
    }
}
