//! Error types returned by the profile entry points.
//!
//! Configuration, resource and driver failures are returned as [`Error`].
//! Internal consistency violations (a frame-done for the wrong session, a free
//! of a channel the pool never issued, a chirp re-armed while a transfer is
//! still in flight) are not represented here: they panic.

use core::fmt;

use crate::driver::{SessionHandle, SessionKind};
use crate::profile::ProfileState;

/// Raw status code reported by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverError(pub i32);

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver status {}", self.0)
    }
}

/// Errors reported by the LVDS stream profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A command payload or configuration value is malformed.
    #[error("invalid argument")]
    InvalidArgument,

    /// The command code or acquisition mode is not handled by this profile.
    #[error("not supported")]
    NotSupported,

    /// One DMA block would not fit in the capture peripheral.
    #[error("transfer of {requested} bytes exceeds the {capacity} byte capture capacity")]
    CaptureSizeExceeded { requested: u32, capacity: u32 },

    /// Every channel in the session's pool is already issued.
    #[error("no free DMA channel left for the {0:?} session")]
    ChannelsExhausted(SessionKind),

    /// The controller reports a session on the link that this profile never created.
    #[error("controller reports unknown active session {0:?}")]
    UnknownSession(SessionHandle),

    /// The lifecycle call is not valid in the current state.
    #[error("{operation} is not allowed while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: ProfileState,
    },

    /// The session controller rejected a request.
    #[error("session controller: {0}")]
    Session(DriverError),

    /// The DMA engine rejected a request.
    #[error("dma engine: {0}")]
    Dma(DriverError),

    /// The header subsystem rejected a request.
    #[error("header subsystem: {0}")]
    Header(DriverError),
}
