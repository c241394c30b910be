//! Per-key async mutexes

use std::{hash::Hash, sync::Arc};

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Slot = Arc<Mutex<()>>;

/// Hands out one async mutex per key.
///
/// A slot lives only while some caller holds or waits on it. The last guard
/// released for a key removes its slot, so keys that were never in any store
/// leave nothing behind.
pub struct KeyedLocks<K: Eq + Hash> {
    slots: Arc<DashMap<K, Slot>>,
}

/// Exclusive access to one key. Dropping it releases the key.
pub struct KeyGuard<K: Eq + Hash> {
    guard: Option<OwnedMutexGuard<()>>,
    slot: Slot,
    key: K,
    slots: Arc<DashMap<K, Slot>>,
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
        }
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &K) -> KeyGuard<K> {
        let slot = self.slots.entry(key.clone()).or_default().clone();
        let guard = slot.clone().lock_owned().await;
        KeyGuard {
            guard: Some(guard),
            slot,
            key: key.clone(),
            slots: self.slots.clone(),
        }
    }

    /// Keys currently held or waited on
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> Drop for KeyGuard<K> {
    fn drop(&mut self) {
        self.guard.take();
        // One reference in the map and one here means nobody is waiting
        self.slots.remove_if(&self.key, |_, slot| {
            Arc::ptr_eq(slot, &self.slot) && Arc::strong_count(slot) == 2
        });
    }
}
