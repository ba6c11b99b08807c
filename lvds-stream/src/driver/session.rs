//! Session controller contract.
//!
//! A session is one activatable unit of streaming work bound to the LVDS link.
//! The controller allows at most one active session at a time; the profile
//! alternates between the hardware capture session and the software
//! user-buffer session on frame boundaries.

use crate::channel::ChannelAllocator;
use crate::config::{DataFormat, LinkConfig};
use crate::constants::MAX_CQ;
use crate::error::DriverError;

use super::header::HeaderBlock;

/// Opaque handle to a session created by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(u32);

impl SessionHandle {
    /// Wrap a controller-assigned session identifier.
    pub const fn new(id: u32) -> Self {
        SessionHandle(id)
    }

    /// The controller-assigned identifier.
    pub const fn id(&self) -> u32 {
        self.0
    }
}

/// Execution mode of a session. Also selects the DMA channel pool it draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Triggered by the capture peripheral; streams live ADC data.
    Hardware,
    /// Triggered by software; streams static user buffers.
    Software,
}

/// Sample data type carried by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Real,
    Complex,
}

/// Channel layout of the captured samples. Must match the capture peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Interleaved,
    NonInterleaved,
}

/// How the hardware session is paced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationalMode {
    /// Frame-based: one transfer per `threshold` chirps.
    Chirp { threshold: u8 },
    /// Free-running continuous capture.
    Continuous,
}

/// Hardware-session specific settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareSessionConfig {
    pub data_mode: DataMode,
    pub data_format: DataFormat,
    pub num_chirps_per_frame: u32,
    /// Monitor queue sizes, in link units.
    pub cq_size: [u16; MAX_CQ],
    pub op_mode: OperationalMode,
    /// ADC samples per chirp, or the transfer size in continuous mode.
    pub num_adc_samples: u16,
}

/// One user buffer streamed by the software session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserBufferInfo {
    /// Address of the buffer; 0 when the slot is unused.
    pub address: u32,
    /// Size in link units.
    pub size: u32,
}

/// Software-session specific settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareSessionConfig {
    pub user_buffers: [UserBufferInfo; 2],
}

/// Source-specific part of a session descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSource {
    Hardware(HardwareSessionConfig),
    Software(SoftwareSessionConfig),
}

/// Session descriptor handed to [`SessionController::create_session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub data_type: DataType,
    /// Raise a frame-done notification for this session.
    pub frame_done: bool,
    /// Header block prefixed to every frame, if header mode is on.
    pub header: Option<HeaderBlock>,
    pub source: SessionSource,
}

impl SessionConfig {
    /// Execution mode implied by the session source.
    pub fn kind(&self) -> SessionKind {
        match self.source {
            SessionSource::Hardware(_) => SessionKind::Hardware,
            SessionSource::Software(_) => SessionKind::Software,
        }
    }
}

/// Streaming statistics kept by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamStats {
    pub frame_start_errors: u32,
    pub chirp_errors: u32,
    pub frames_done: u32,
    pub chirps_done: u32,
}

/// Contract for the streaming session controller (the CBUFF block).
///
/// Run-time calls take `&self`: they are issued from interrupt context
/// (frame-done hand-off) as well as from the polling loop, so implementations
/// provide their own interior synchronisation.
pub trait SessionController {
    /// Bring up the controller for the given link.
    fn init(&mut self, link: &LinkConfig) -> Result<(), DriverError>;

    /// Shut the controller down.
    fn deinit(&mut self) -> Result<(), DriverError>;

    /// Create a session. DMA channels are drawn from `channels`.
    fn create_session(
        &self,
        cfg: &SessionConfig,
        channels: &mut dyn ChannelAllocator,
    ) -> Result<SessionHandle, DriverError>;

    /// Delete an inactive session, returning its DMA channels to `channels`.
    fn delete_session(
        &self,
        session: SessionHandle,
        channels: &mut dyn ChannelAllocator,
    ) -> Result<(), DriverError>;

    /// Make `session` the active session on the link.
    fn activate_session(&self, session: SessionHandle) -> Result<(), DriverError>;

    /// Take `session` off the link.
    fn deactivate_session(&self, session: SessionHandle) -> Result<(), DriverError>;

    /// The session currently driving the link, if any.
    fn active_session(&self) -> Result<Option<SessionHandle>, DriverError>;

    /// Snapshot the streaming statistics.
    fn stats(&self) -> Result<StreamStats, DriverError>;

    /// Reset the streaming statistics.
    fn clear_stats(&self) -> Result<(), DriverError>;
}
