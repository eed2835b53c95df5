use std::sync::Arc;

use crate::{
    interest::Interest,
    key::{Attachment, RegistrationKey},
};

/// Identity of a multiplexer instance. A channel holds at most one valid
/// key per `MuxId` at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MuxId(pub usize);

/// Identity of a channel instance, as seen from a multiplexer through the
/// keys it handed out. A multiplexer never owns the channel itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub usize);

/// A readiness-notification engine that watches channels for I/O readiness.
///
/// The polling mechanism itself is outside this crate; the registration core
/// only needs the two calls below. Implementors that create keys must hold a
/// `Weak` reference to themselves (e.g. via [`Arc::new_cyclic`]) so that
/// keys carry a non-owning back-reference.
pub trait Multiplexer: Send + Sync {
    fn id(&self) -> MuxId;

    /// Creates the key representing `channel`'s membership in this
    /// multiplexer's watch set and starts tracking the channel.
    ///
    /// Called by [`ChannelGuard::register`](crate::channel::ChannelGuard::register)
    /// while the channel's registration-protocol lock is held, so a single
    /// channel never races two insertions for the same multiplexer.
    fn make_key(
        &self,
        channel: ChannelId,
        interest: Interest,
        attachment: Option<Attachment>,
    ) -> Arc<RegistrationKey>;

    /// Cancels a key, invalidating it before returning.
    ///
    /// Must be idempotent, must not assume any lock of this multiplexer is
    /// already held by the caller, and must not call back into the owning
    /// channel's registry (purging the channel's bookkeeping happens later,
    /// through [`ChannelGuard::remove_key`](crate::channel::ChannelGuard::remove_key)).
    fn cancel(&self, key: &Arc<RegistrationKey>);
}
