//! Streaming sessions: building them from configuration and scheduling them
//! onto the shared link.
//!
//! [`builder`] validates the acquisition settings and creates the sessions;
//! [`scheduler`] hands the link back and forth between them on frame
//! boundaries.

pub mod builder;
pub mod scheduler;

pub use builder::TransferGeometry;
pub use scheduler::{SchedulerState, SessionScheduler};

use crate::driver::{SessionConfig, SessionHandle, SessionKind};

/// A session created on the controller, together with the descriptor it was
/// created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub handle: SessionHandle,
    pub config: SessionConfig,
}

impl Session {
    pub fn kind(&self) -> SessionKind {
        self.config.kind()
    }

    /// Whether a header block was attached when the session was created.
    pub fn has_header(&self) -> bool {
        self.config.header.is_some_and(|h| h.size != 0)
    }
}
