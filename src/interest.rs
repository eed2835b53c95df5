use bitflags::bitflags;

bitflags! {
    /// Readiness conditions a registration cares about.
    ///
    /// A concrete channel type reports the subset it supports through
    /// [`ChannelHooks::valid_ops`](crate::channel::ChannelHooks::valid_ops);
    /// registrations may only ask for bits within that subset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interest: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 2;
        const CONNECT = 1 << 3;
        const ACCEPT = 1 << 4;
    }
}

impl Interest {
    /// True if every bit of `self` is supported by `valid_ops`.
    pub fn is_subset_of(&self, valid_ops: Interest) -> bool {
        valid_ops.contains(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subset() {
        let stream_ops = Interest::READ | Interest::WRITE | Interest::CONNECT;

        assert!(Interest::READ.is_subset_of(stream_ops));
        assert!((Interest::READ | Interest::WRITE).is_subset_of(stream_ops));
        assert!(Interest::empty().is_subset_of(stream_ops));

        assert!(!Interest::ACCEPT.is_subset_of(stream_ops));
        assert!(!(Interest::READ | Interest::ACCEPT).is_subset_of(stream_ops));
    }

    #[test]
    fn test_bit_values() {
        assert_eq!(Interest::READ.bits(), 1);
        assert_eq!(Interest::WRITE.bits(), 4);
        assert_eq!(Interest::CONNECT.bits(), 8);
        assert_eq!(Interest::ACCEPT.bits(), 16);
    }
}
