use std::sync::{Arc, Mutex};

use log::trace;

use crate::{key::RegistrationKey, mux::MuxId};

const INITIAL_SLOTS: usize = 4;

/// Per-channel collection of registration keys, indexed by slot.
///
/// Slots are tombstoned on removal and reused by later insertions; the
/// backing storage doubles when full and never shrinks. The number of
/// multiplexers watching a single channel is small in practice, so lookups
/// are linear scans under the registry's own lock.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    slots: Vec<Option<Arc<RegistrationKey>>>,
    count: usize,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key to the first empty slot, growing the storage if none is
    /// free. Callers ensure at most one valid key per multiplexer exists;
    /// no duplicate check happens here.
    pub fn insert(&self, key: Arc<RegistrationKey>) {
        let mut inner = self.inner.lock().unwrap();

        let free = inner.slots.iter().position(|slot| slot.is_none());

        let index = match free {
            Some(index) => index,
            None => {
                let index = inner.slots.len();
                let grown = if inner.slots.is_empty() {
                    INITIAL_SLOTS
                } else {
                    inner.slots.len() * 2
                };

                trace!("key registry growing to {grown} slots");
                inner.slots.resize_with(grown, || None);
                index
            }
        };

        inner.slots[index] = Some(key);
        inner.count += 1;
    }

    /// The key registered for `mux`, if any. Cancelled keys are never
    /// returned, even while their slot is still occupied.
    pub fn find(&self, mux: MuxId) -> Option<Arc<RegistrationKey>> {
        let inner = self.inner.lock().unwrap();

        inner
            .slots
            .iter()
            .flatten()
            .find(|key| key.mux() == mux && key.is_valid())
            .cloned()
    }

    /// Removes a key, located by identity rather than by multiplexer id so
    /// that a re-registered multiplexer cannot be confused with a stale
    /// entry. The key is invalidated inside the same critical section;
    /// returns false if the key is not present.
    pub fn remove(&self, key: &Arc<RegistrationKey>) -> bool {
        let mut inner = self.inner.lock().unwrap();

        let slot = inner
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(k) if Arc::ptr_eq(k, key)));

        match slot {
            Some(slot) => {
                *slot = None;
                inner.count -= 1;
                key.invalidate();
                true
            }
            None => false,
        }
    }

    /// True if at least one occupied slot holds a still-valid key.
    pub fn any_live(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.slots.iter().flatten().any(|key| key.is_valid())
    }

    /// Number of occupied slots (live or not).
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current size of the backing storage, including empty slots.
    pub(crate) fn capacity(&self) -> usize {
        self.inner.lock().unwrap().slots.len()
    }

    /// Cancels every still-valid key under the registry lock, going through
    /// each key's multiplexer where it is still alive. Returns the number of
    /// keys this call cancelled. Entries stay in their slots, invalidated.
    pub(crate) fn cancel_all(&self) -> usize {
        let inner = self.inner.lock().unwrap();

        let mut cancelled = 0;
        for key in inner.slots.iter().flatten() {
            if !key.is_valid() {
                continue;
            }

            if let Some(mux) = key.multiplexer() {
                mux.cancel(key);
            }

            key.invalidate();
            cancelled += 1;
        }

        cancelled
    }
}
