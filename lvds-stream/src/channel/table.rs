//! Compile-time DMA channel assignments.

use crate::constants::{HW_SESSION_MAX_DMA_CHANNELS, NUM_DMA_CHANNELS, SW_SESSION_MAX_DMA_CHANNELS};

/// Request line of the link's first (hardware) DMA trigger.
const REQ_CBUFF_0: u8 = 34;
/// Request line of the link's second (software) DMA trigger.
const REQ_CBUFF_1: u8 = 35;
/// First request line with no peripheral attached.
const REQ_FREE_0: u8 = 48;

const fn free(n: u8) -> u8 {
    REQ_FREE_0 + n
}

/// Channel pair handed to the session controller: the channel it chains
/// through and the link-only param slot that shadows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub chain_channel: u8,
    pub shadow_link_channel: u16,
}

impl ChannelDescriptor {
    const fn new(chain_channel: u8, shadow: u16) -> Self {
        ChannelDescriptor {
            chain_channel,
            shadow_link_channel: NUM_DMA_CHANNELS + shadow,
        }
    }
}

/// DMA channel that moves ADC data into the capture region.
pub const CAPTURE_CHANNEL_ID: u8 = free(14);

/// Link-only param slot the capture channel reloads from.
pub const CAPTURE_LINK_PARAM_ID: u16 = NUM_DMA_CHANNELS
    + HW_SESSION_MAX_DMA_CHANNELS as u16
    + SW_SESSION_MAX_DMA_CHANNELS as u16;

/// Channels available to the hardware session.
pub static HW_CHANNEL_TABLE: [ChannelDescriptor; HW_SESSION_MAX_DMA_CHANNELS] = [
    ChannelDescriptor::new(REQ_CBUFF_0, 0),
    ChannelDescriptor::new(free(0), 1),
    ChannelDescriptor::new(free(1), 2),
    ChannelDescriptor::new(free(2), 3),
    ChannelDescriptor::new(free(3), 4),
    ChannelDescriptor::new(free(4), 5),
    ChannelDescriptor::new(free(5), 6),
    ChannelDescriptor::new(free(6), 7),
    ChannelDescriptor::new(free(7), 8),
    ChannelDescriptor::new(free(8), 9),
    ChannelDescriptor::new(free(9), 10),
    ChannelDescriptor::new(free(10), 11),
    ChannelDescriptor::new(free(11), 12),
];

/// Channels available to the software session.
pub static SW_CHANNEL_TABLE: [ChannelDescriptor; SW_SESSION_MAX_DMA_CHANNELS] = [
    ChannelDescriptor::new(REQ_CBUFF_1, 13),
    ChannelDescriptor::new(free(12), 14),
    ChannelDescriptor::new(free(13), 15),
];
