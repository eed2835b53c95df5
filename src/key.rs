use std::{
    any::Any,
    fmt,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicBool, Ordering},
    },
};

use crate::{
    interest::Interest,
    mux::{ChannelId, Multiplexer, MuxId},
};

/// Opaque value carried along with a registration, handed back by the
/// multiplexer when it reports readiness.
pub type Attachment = Arc<dyn Any + Send + Sync>;

/// The record representing one channel's membership in one multiplexer's
/// watch set.
///
/// A key is shared between exactly one channel and one multiplexer. It is
/// valid from creation until cancelled; cancellation is permanent, and a
/// cancelled key is never returned by lookup again. Interest and attachment
/// are only mutated by the owning channel while it holds the
/// registration-protocol lock; invalidation can come from either side.
pub struct RegistrationKey {
    channel: ChannelId,
    mux: MuxId,
    mux_ref: Weak<dyn Multiplexer>,
    state: Mutex<KeyState>,
    valid: AtomicBool,
}

struct KeyState {
    interest: Interest,
    attachment: Option<Attachment>,
}

impl RegistrationKey {
    pub fn new(
        channel: ChannelId,
        mux: MuxId,
        mux_ref: Weak<dyn Multiplexer>,
        interest: Interest,
        attachment: Option<Attachment>,
    ) -> Arc<Self> {
        Arc::new(Self {
            channel,
            mux,
            mux_ref,
            state: Mutex::new(KeyState {
                interest,
                attachment,
            }),
            valid: AtomicBool::new(true),
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    pub fn mux(&self) -> MuxId {
        self.mux
    }

    /// The multiplexer this key belongs to, if it is still alive. The key
    /// does not extend the multiplexer's lifetime.
    pub fn multiplexer(&self) -> Option<Arc<dyn Multiplexer>> {
        self.mux_ref.upgrade()
    }

    pub fn interest(&self) -> Interest {
        self.state.lock().unwrap().interest
    }

    pub fn attachment(&self) -> Option<Attachment> {
        self.state.lock().unwrap().attachment.clone()
    }

    /// Replaces the attachment, returning the previous one.
    pub fn attach(&self, attachment: Option<Attachment>) -> Option<Attachment> {
        std::mem::replace(&mut self.state.lock().unwrap().attachment, attachment)
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Permanently invalidates the key. Idempotent; returns true only for
    /// the call that performed the transition.
    pub fn invalidate(&self) -> bool {
        self.valid.swap(false, Ordering::AcqRel)
    }

    /// Joint interest/attachment update for an idempotent re-registration.
    /// Only the owning channel calls this, under the registration-protocol
    /// lock.
    pub(crate) fn set_registration(&self, interest: Interest, attachment: Option<Attachment>) {
        let mut state = self.state.lock().unwrap();
        state.interest = interest;
        state.attachment = attachment;
    }
}

impl fmt::Debug for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationKey")
            .field("channel", &self.channel)
            .field("mux", &self.mux)
            .field("interest", &self.interest())
            .field("valid", &self.is_valid())
            .finish()
    }
}
