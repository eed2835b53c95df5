//! Registration core for multiplexable I/O channels.
//!
//! A single channel can be watched, concurrently, by multiple readiness
//! multiplexers. This crate provides the bookkeeping that makes that safe:
//! the per-channel [`KeyRegistry`] of registration keys, and the
//! [`ChannelGuard`] enforcing that blocking mode and live registrations
//! stay mutually exclusive, up to and including teardown on close. The
//! readiness polling itself lives behind the [`Multiplexer`] trait and is
//! not part of this crate.

pub mod channel;
pub mod interest;
pub mod key;
pub mod mux;
pub mod registry;

#[cfg(test)]
mod testutil;

pub use channel::{ChannelError, ChannelGuard, ChannelHooks};
pub use interest::Interest;
pub use key::{Attachment, RegistrationKey};
pub use mux::{ChannelId, Multiplexer, MuxId};
pub use registry::KeyRegistry;
