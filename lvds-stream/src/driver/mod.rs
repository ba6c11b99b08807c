//! Driver contracts consumed by the profile.
//!
//! The profile never touches registers itself. It drives three collaborators,
//! each expressed as a trait so the same engine runs on target drivers and on
//! the host simulation used by the tests.
//!
//! | Trait | Role |
//! |-------|------|
//! | [`SessionController`] | Creates, activates and deactivates streaming sessions on the link |
//! | [`DmaEngine`] | Programs the capture channel and its self-linked param set |
//! | [`HeaderBuilder`] | Builds the optional per-session header block |
//!
//! ## Interrupt routing
//!
//! The drivers do not call back into the profile through function pointers.
//! Instead the application forwards each interrupt to the matching profile entry
//! point:
//!
//! - chirp available → [`Profile::chirp_available`](crate::Profile::chirp_available)
//! - capture DMA transfer complete → [`Profile::transfer_complete`](crate::Profile::transfer_complete)
//! - session frame done → [`Profile::frame_done`](crate::Profile::frame_done), tagged
//!   with the [`SessionKind`] the session was created as.
//!
//! Channel allocation for a session is delegated back to the profile's
//! [`ChannelPool`](crate::channel::ChannelPool) through the
//! [`ChannelAllocator`](crate::channel::ChannelAllocator) passed to
//! [`SessionController::create_session`] and [`SessionController::delete_session`].

pub mod dma;
pub mod header;
pub mod session;

pub use dma::{ChannelConfig, DmaAddress, DmaEngine, ParamSet, SyncType};
pub use header::{HeaderBlock, HeaderBuilder};
pub use session::{
    DataMode, DataType, HardwareSessionConfig, OperationalMode, SessionConfig, SessionController,
    SessionHandle, SessionKind, SessionSource, SoftwareSessionConfig, StreamStats, UserBufferInfo,
};
