use log::{trace, warn};

use crate::driver::SessionKind;
use crate::error::Error;

use super::table::{ChannelDescriptor, HW_CHANNEL_TABLE, SW_CHANNEL_TABLE};

/// Allocation interface the session controller uses to obtain DMA channels.
pub trait ChannelAllocator {
    /// Issue the next free channel from the pool for `kind`.
    ///
    /// Returns [`Error::ChannelsExhausted`] without side effects when the pool
    /// has no channel left.
    fn allocate(&mut self, kind: SessionKind) -> Result<ChannelDescriptor, Error>;

    /// Return a channel previously issued by [`allocate`](Self::allocate).
    ///
    /// # Panics
    /// Panics if `channel` belongs to neither table.
    fn free(&mut self, channel: &ChannelDescriptor);
}

/// Bump allocator over the two fixed channel tables.
///
/// Each table has a next-free cursor. Allocation copies the entry under the
/// cursor and advances it; freeing locates the entry and steps the owning
/// cursor back. Sessions release all of their channels at once on delete, so
/// the cursor never needs to track which individual entries are out.
#[derive(Debug)]
pub struct ChannelPool {
    hw_index: usize,
    sw_index: usize,
    /// Pool that last refused an allocation, cleared by [`take_exhaustion`](Self::take_exhaustion).
    exhausted: Option<SessionKind>,
}

impl ChannelPool {
    /// Create a pool with every channel free.
    pub const fn new() -> Self {
        ChannelPool {
            hw_index: 0,
            sw_index: 0,
            exhausted: None,
        }
    }

    fn table(kind: SessionKind) -> &'static [ChannelDescriptor] {
        match kind {
            SessionKind::Hardware => &HW_CHANNEL_TABLE,
            SessionKind::Software => &SW_CHANNEL_TABLE,
        }
    }

    fn index_mut(&mut self, kind: SessionKind) -> &mut usize {
        match kind {
            SessionKind::Hardware => &mut self.hw_index,
            SessionKind::Software => &mut self.sw_index,
        }
    }

    /// Number of channels currently issued from the pool for `kind`.
    pub fn allocated(&self, kind: SessionKind) -> usize {
        match kind {
            SessionKind::Hardware => self.hw_index,
            SessionKind::Software => self.sw_index,
        }
    }

    /// Total number of channels provisioned for `kind`.
    pub fn capacity(kind: SessionKind) -> usize {
        Self::table(kind).len()
    }

    /// Report (and clear) the pool that last ran out of channels.
    ///
    /// Lets the caller turn an opaque session-creation failure back into
    /// [`Error::ChannelsExhausted`].
    pub fn take_exhaustion(&mut self) -> Option<SessionKind> {
        self.exhausted.take()
    }
}

impl Default for ChannelPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelAllocator for ChannelPool {
    fn allocate(&mut self, kind: SessionKind) -> Result<ChannelDescriptor, Error> {
        let table = Self::table(kind);
        let Some(&channel) = table.get(self.allocated(kind)) else {
            warn!("{:?} DMA channel pool exhausted ({} in use)", kind, table.len());
            self.exhausted = Some(kind);
            return Err(Error::ChannelsExhausted(kind));
        };
        *self.index_mut(kind) += 1;
        trace!("allocated {:?} for {:?} session", channel, kind);
        Ok(channel)
    }

    fn free(&mut self, channel: &ChannelDescriptor) {
        let owner = [SessionKind::Hardware, SessionKind::Software]
            .into_iter()
            .find(|&kind| Self::table(kind).contains(channel));

        let Some(kind) = owner else {
            panic!("freeing DMA channel {:?} that no pool issued", channel);
        };
        let index = self.index_mut(kind);
        assert!(*index > 0, "freeing {:?} channel with none allocated", kind);
        *index -= 1;
        trace!("released {:?} from {:?} session", channel, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn allocates_in_table_order() {
        let mut pool = ChannelPool::new();
        for expected in HW_CHANNEL_TABLE.iter() {
            assert_eq!(pool.allocate(SessionKind::Hardware).unwrap(), *expected);
        }
        for expected in SW_CHANNEL_TABLE.iter() {
            assert_eq!(pool.allocate(SessionKind::Software).unwrap(), *expected);
        }
    }

    #[test]
    fn pools_are_independent() {
        let mut pool = ChannelPool::new();
        pool.allocate(SessionKind::Hardware).unwrap();
        pool.allocate(SessionKind::Hardware).unwrap();
        assert_eq!(pool.allocated(SessionKind::Hardware), 2);
        assert_eq!(pool.allocated(SessionKind::Software), 0);
    }

    #[test]
    fn exhaustion_leaves_index_unchanged() {
        let mut pool = ChannelPool::new();
        for _ in 0..ChannelPool::capacity(SessionKind::Software) {
            pool.allocate(SessionKind::Software).unwrap();
        }
        assert_eq!(
            pool.allocate(SessionKind::Software),
            Err(Error::ChannelsExhausted(SessionKind::Software))
        );
        assert_eq!(pool.allocated(SessionKind::Software), 3);
        assert_eq!(pool.take_exhaustion(), Some(SessionKind::Software));
        assert_eq!(pool.take_exhaustion(), None);
    }

    #[test]
    fn free_returns_to_owning_pool() {
        let mut pool = ChannelPool::new();
        let hw = pool.allocate(SessionKind::Hardware).unwrap();
        let sw = pool.allocate(SessionKind::Software).unwrap();

        pool.free(&sw);
        assert_eq!(pool.allocated(SessionKind::Software), 0);
        assert_eq!(pool.allocated(SessionKind::Hardware), 1);

        pool.free(&hw);
        assert_eq!(pool.allocated(SessionKind::Hardware), 0);
    }

    #[test]
    #[should_panic(expected = "no pool issued")]
    fn free_of_unknown_channel_is_fatal() {
        let mut pool = ChannelPool::new();
        pool.allocate(SessionKind::Hardware).unwrap();
        pool.free(&ChannelDescriptor {
            chain_channel: 0,
            shadow_link_channel: 0,
        });
    }

    #[test]
    #[should_panic(expected = "none allocated")]
    fn free_without_allocation_is_fatal() {
        let mut pool = ChannelPool::new();
        pool.free(&HW_CHANNEL_TABLE[0]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Alloc(SessionKind),
        Free(SessionKind),
    }

    fn kind() -> impl Strategy<Value = SessionKind> {
        prop_oneof![Just(SessionKind::Hardware), Just(SessionKind::Software)]
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![kind().prop_map(Op::Alloc), kind().prop_map(Op::Free)]
    }

    proptest! {
        #[test]
        fn index_tracks_outstanding_channels(ops in proptest::collection::vec(op(), 0..64)) {
            let mut pool = ChannelPool::new();
            let mut issued_hw = Vec::new();
            let mut issued_sw = Vec::new();

            for op in ops {
                match op {
                    Op::Alloc(kind) => {
                        let issued = match kind {
                            SessionKind::Hardware => &mut issued_hw,
                            SessionKind::Software => &mut issued_sw,
                        };
                        let before = pool.allocated(kind);
                        match pool.allocate(kind) {
                            Ok(channel) => issued.push(channel),
                            Err(err) => {
                                prop_assert_eq!(err, Error::ChannelsExhausted(kind));
                                prop_assert_eq!(before, ChannelPool::capacity(kind));
                                prop_assert_eq!(pool.allocated(kind), before);
                            }
                        }
                    }
                    Op::Free(kind) => {
                        let issued = match kind {
                            SessionKind::Hardware => &mut issued_hw,
                            SessionKind::Software => &mut issued_sw,
                        };
                        if let Some(channel) = issued.pop() {
                            pool.free(&channel);
                        }
                    }
                }
                prop_assert_eq!(pool.allocated(SessionKind::Hardware), issued_hw.len());
                prop_assert_eq!(pool.allocated(SessionKind::Software), issued_sw.len());
                prop_assert!(issued_hw.len() <= ChannelPool::capacity(SessionKind::Hardware));
                prop_assert!(issued_sw.len() <= ChannelPool::capacity(SessionKind::Software));
            }
        }
    }
}
