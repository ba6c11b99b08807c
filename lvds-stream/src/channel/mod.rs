//! DMA channel pools for the streaming sessions.
//!
//! The session controller needs DMA channels to move data onto the link. It
//! does not own them: each session draws from a fixed table provisioned for
//! its [`SessionKind`](crate::driver::SessionKind) through the
//! [`ChannelAllocator`] interface implemented by [`ChannelPool`].
//!
//! | Pool | Table | Entries |
//! |------|-------|---------|
//! | Hardware | [`HW_CHANNEL_TABLE`] | 13 |
//! | Software | [`SW_CHANNEL_TABLE`] | 3 |

pub mod pool;
pub mod table;

pub use pool::{ChannelAllocator, ChannelPool};
pub use table::{
    ChannelDescriptor, CAPTURE_CHANNEL_ID, CAPTURE_LINK_PARAM_ID, HW_CHANNEL_TABLE,
    SW_CHANNEL_TABLE,
};
