//! Test doubles for the multiplexer and channel-hook seams.

use std::sync::{
    Arc, Mutex, Weak,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    channel::ChannelHooks,
    interest::Interest,
    key::{Attachment, RegistrationKey},
    mux::{ChannelId, Multiplexer, MuxId},
};

/// A multiplexer that hands out keys and records cancellations, without any
/// actual readiness polling behind it.
pub struct TestMux {
    id: MuxId,
    this: Weak<TestMux>,
    keys: Mutex<Vec<Arc<RegistrationKey>>>,
    cancelled: AtomicUsize,
}

impl TestMux {
    pub fn new(id: usize) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            id: MuxId(id),
            this: this.clone(),
            keys: Mutex::new(vec![]),
            cancelled: AtomicUsize::new(0),
        })
    }

    pub fn num_keys(&self) -> usize {
        self.keys.lock().unwrap().len()
    }

    /// Number of cancellations that actually invalidated a key.
    pub fn num_cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Multiplexer for TestMux {
    fn id(&self) -> MuxId {
        self.id
    }

    fn make_key(
        &self,
        channel: ChannelId,
        interest: Interest,
        attachment: Option<Attachment>,
    ) -> Arc<RegistrationKey> {
        let mux_ref: Weak<dyn Multiplexer> = self.this.clone();
        let key = RegistrationKey::new(channel, self.id, mux_ref, interest, attachment);

        self.keys.lock().unwrap().push(key.clone());
        key
    }

    fn cancel(&self, key: &Arc<RegistrationKey>) {
        if key.invalidate() {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Channel hooks that record every call they receive.
#[derive(Clone)]
pub struct TestHooks {
    valid_ops: Interest,
    modes: Arc<Mutex<Vec<bool>>>,
    released: Arc<AtomicUsize>,
}

impl TestHooks {
    pub fn with_valid_ops(valid_ops: Interest) -> Self {
        Self {
            valid_ops,
            modes: Arc::default(),
            released: Arc::default(),
        }
    }

    /// Hooks for a stream-like channel supporting read, write and connect.
    pub fn stream_ops() -> Self {
        Self::with_valid_ops(Interest::READ | Interest::WRITE | Interest::CONNECT)
    }

    /// Modes passed to `configure_blocking`, in call order.
    pub fn blocking_modes(&self) -> Vec<bool> {
        self.modes.lock().unwrap().clone()
    }

    pub fn num_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ChannelHooks for TestHooks {
    fn valid_ops(&self) -> Interest {
        self.valid_ops
    }

    fn configure_blocking(&self, block: bool) {
        self.modes.lock().unwrap().push(block);
    }

    fn release_resources(&self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
