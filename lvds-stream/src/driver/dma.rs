//! DMA engine contract.
//!
//! The capture path uses one DMA channel whose param set is mirrored into a
//! link slot that links to itself, so the channel re-arms after every block
//! without software involvement. Only the destination address changes between
//! transfers.
//!
//! ```text
//!  ADC buffer ──(A = element, B = chirp threshold)──► capture region[current]
//!                 channel param ──link──► link slot ──link──┐
//!                                            ▲──────────────┘
//! ```

use crate::error::DriverError;

/// Address as seen by the DMA engine.
pub type DmaAddress = u32;

/// Synchronisation type of a param set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncType {
    /// One event moves one A-count array.
    A,
    /// One event moves a full A×B frame.
    AB,
}

/// One DMA param set (transfer descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSet {
    pub source_address: DmaAddress,
    pub destination_address: DmaAddress,
    pub a_count: u16,
    pub b_count: u16,
    pub c_count: u16,
    pub b_count_reload: u16,
    pub source_b_index: i16,
    pub destination_b_index: i16,
    pub source_c_index: i16,
    pub destination_c_index: i16,
    /// Param slot to reload on completion; `None` terminates the chain.
    pub link: Option<u16>,
    pub sync: SyncType,
    pub transfer_completion_code: u8,
    pub static_set: bool,
    pub early_completion: bool,
    pub final_interrupt: bool,
    pub intermediate_interrupt: bool,
    pub final_chaining: bool,
    pub intermediate_chaining: bool,
}

/// Channel configuration passed to [`DmaEngine::configure_channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    pub channel_id: u8,
    pub param_id: u16,
    pub event_queue: u8,
    pub param_set: ParamSet,
}

/// Contract for the DMA engine driver.
///
/// When a param set has `final_interrupt` enabled, the application routes the
/// engine's completion interrupt for that channel to
/// [`Profile::transfer_complete`](crate::Profile::transfer_complete).
pub trait DmaEngine {
    /// Stop a channel from reacting to events.
    fn disable_channel(&self, channel: u8) -> Result<(), DriverError>;

    /// Program a channel and its own param set.
    fn configure_channel(&self, cfg: &ChannelConfig) -> Result<(), DriverError>;

    /// Program a standalone param slot.
    fn configure_param_set(&self, param_id: u16, params: &ParamSet) -> Result<(), DriverError>;

    /// Make `from` reload `to` when it completes.
    fn link_param_sets(&self, from: u16, to: u16) -> Result<(), DriverError>;

    /// Change the destination address of a channel's active param set.
    fn set_destination_address(&self, channel: u8, address: DmaAddress) -> Result<(), DriverError>;

    /// Manually trigger a transfer on a channel.
    fn start_transfer(&self, channel: u8) -> Result<(), DriverError>;
}
