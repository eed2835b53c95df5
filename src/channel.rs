use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use log::{debug, trace};
use thiserror::Error;

use crate::{
    interest::Interest,
    key::{Attachment, RegistrationKey},
    mux::{ChannelId, Multiplexer, MuxId},
    registry::KeyRegistry,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("The channel is closed")]
    Closed,

    #[error("Interest contains operations not supported by this channel")]
    InvalidInterest,

    #[error("Operation conflicts with the channel's blocking mode")]
    IllegalMode,
}

/// Hooks supplied by the concrete channel type sitting around the guard.
/// All of them are invoked synchronously while the guard holds its
/// registration-protocol lock.
pub trait ChannelHooks: Send + Sync {
    /// Bitmask of readiness operations this channel type supports.
    fn valid_ops(&self) -> Interest;

    /// Applies the requested blocking mode to the underlying resource.
    fn configure_blocking(&self, block: bool);

    /// Releases the underlying resource during close.
    fn release_resources(&self);
}

/// Registration and blocking-mode state of one multiplexable channel.
///
/// The guard owns the channel's [`KeyRegistry`] and its blocking flag, and
/// enforces that blocking mode and live multiplexer registrations are
/// mutually exclusive at every observable point. Two locks are involved:
/// the registry's own lock, and the registration-protocol lock serializing
/// `register`/`configure_blocking`/`close` as a group. The protocol lock
/// may be held while taking the registry lock, never the other way around.
pub struct ChannelGuard {
    id: ChannelId,
    hooks: Arc<dyn ChannelHooks>,
    keys: KeyRegistry,
    state: Mutex<GuardState>,
    closed: AtomicBool,
}

struct GuardState {
    blocking: bool,
}

impl ChannelGuard {
    /// A new guard for an open channel in non-blocking mode.
    pub fn new(id: ChannelId, hooks: Arc<dyn ChannelHooks>) -> Self {
        Self {
            id,
            hooks,
            keys: KeyRegistry::new(),
            state: Mutex::new(GuardState { blocking: false }),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    pub fn is_blocking(&self) -> bool {
        self.state.lock().unwrap().blocking
    }

    /// True if any slot of the key registry is occupied. A cancelled but
    /// not yet removed key still counts; see [`ChannelGuard::remove_key`].
    pub fn is_registered(&self) -> bool {
        !self.keys.is_empty()
    }

    /// The key representing this channel's membership in `mux`, if a valid
    /// one exists.
    pub fn key_for(&self, mux: MuxId) -> Option<Arc<RegistrationKey>> {
        self.keys.find(mux)
    }

    /// Registers the channel with `mux`, or updates the existing
    /// registration.
    ///
    /// Re-registering with the same multiplexer is idempotent: the interest
    /// set and attachment are replaced atomically and the already existing
    /// key is returned, identity unchanged. Fails with
    /// [`ChannelError::Closed`] on a closed channel,
    /// [`ChannelError::InvalidInterest`] if `interest` asks for operations
    /// outside [`ChannelHooks::valid_ops`], and [`ChannelError::IllegalMode`]
    /// while the channel is in blocking mode. On failure nothing is mutated.
    pub fn register(
        &self,
        mux: &dyn Multiplexer,
        interest: Interest,
        attachment: Option<Attachment>,
    ) -> Result<Arc<RegistrationKey>, ChannelError> {
        let state = self.state.lock().unwrap();

        if !self.is_open() {
            return Err(ChannelError::Closed);
        }

        if !interest.is_subset_of(self.hooks.valid_ops()) {
            return Err(ChannelError::InvalidInterest);
        }

        if state.blocking {
            return Err(ChannelError::IllegalMode);
        }

        if let Some(key) = self.keys.find(mux.id()) {
            trace!(
                "channel {:?}: updating registration with mux {:?} to {:?}",
                self.id,
                mux.id(),
                interest
            );

            key.set_registration(interest, attachment);
            return Ok(key);
        }

        // The protocol lock is still held across this external call, so two
        // threads cannot race an insertion for the same multiplexer.
        let key = mux.make_key(self.id, interest, attachment);
        self.keys.insert(key.clone());

        debug!(
            "channel {:?}: registered with mux {:?} ({:?})",
            self.id,
            mux.id(),
            interest
        );

        Ok(key)
    }

    /// Switches the channel between blocking and non-blocking mode.
    ///
    /// Requesting the current mode is a no-op. Switching to blocking mode
    /// fails with [`ChannelError::IllegalMode`] while any registration is
    /// still live, leaving the mode unchanged.
    pub fn configure_blocking(&self, block: bool) -> Result<(), ChannelError> {
        let mut state = self.state.lock().unwrap();

        if !self.is_open() {
            return Err(ChannelError::Closed);
        }

        // Re-checked under the lock: a concurrent call may have won the race
        if state.blocking == block {
            return Ok(());
        }

        if block && self.keys.any_live() {
            return Err(ChannelError::IllegalMode);
        }

        self.hooks.configure_blocking(block);
        state.blocking = block;

        Ok(())
    }

    /// Closes the channel: releases the underlying resource, then cancels
    /// every key still valid.
    ///
    /// Idempotent, including under concurrent invocation: the losing call
    /// performs no side effects, but waits for the winner's teardown before
    /// returning. After any `close()` returns, no key of this channel is
    /// valid in any multiplexer and every subsequent `register` fails with
    /// [`ChannelError::Closed`]. Invalidated entries may remain in the
    /// registry.
    pub fn close(&self) {
        let _state = self.state.lock().unwrap();

        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.hooks.release_resources();

        let cancelled = self.keys.cancel_all();
        if cancelled > 0 {
            debug!("channel {:?}: closed, {cancelled} keys cancelled", self.id);
        }
    }

    /// Purges a cancelled key from the channel's bookkeeping, freeing its
    /// slot. This is the multiplexer-side deregistration path, called once
    /// the multiplexer has processed a cancellation; the channel never needs
    /// it on its own, and until it happens [`ChannelGuard::is_registered`]
    /// keeps reporting the stale entry.
    pub fn remove_key(&self, key: &Arc<RegistrationKey>) -> bool {
        self.keys.remove(key)
    }
}
