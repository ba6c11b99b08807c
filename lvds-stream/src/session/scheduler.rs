//! Hardware / software session hand-off on frame boundaries.
//!
//! Only one session may drive the link at a time. After every hardware frame
//! the link is handed to the software session (if one exists), and after every
//! software frame it is handed back:
//!
//! ```text
//!              start
//!                │
//!                ▼         HW frame done (SW session exists)
//!        ┌──────────────┐ ─────────────────────────────► ┌──────────────┐
//!        │HardwareActive│                                │SoftwareActive│
//!        └──────────────┘ ◄───────────────────────────── └──────────────┘
//!          │    ▲              SW frame done
//!          └────┘ HW frame done (no SW session)
//! ```
//!
//! While a stop is in progress both frame-done signals are ignored; the stop
//! sequence owns deactivation. The active session is always read back from
//! the controller, never cached here.

use core::sync::atomic::{AtomicBool, Ordering};

use log::{debug, trace, warn};

use crate::driver::{SessionController, SessionHandle, SessionKind};
use crate::error::Error;

use super::Session;

/// Which session currently drives the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    NoSessionActive,
    HardwareActive,
    SoftwareActive,
}

/// Owns the created sessions and switches between them.
#[derive(Debug)]
pub struct SessionScheduler {
    hardware: Option<Session>,
    software: Option<Session>,
    stopping: AtomicBool,
}

impl SessionScheduler {
    pub const fn new() -> Self {
        SessionScheduler {
            hardware: None,
            software: None,
            stopping: AtomicBool::new(false),
        }
    }

    pub fn hardware(&self) -> Option<&Session> {
        self.hardware.as_ref()
    }

    pub fn software(&self) -> Option<&Session> {
        self.software.as_ref()
    }

    /// Storage for the session of `kind`, for (re)configuration.
    pub fn slot_mut(&mut self, kind: SessionKind) -> &mut Option<Session> {
        match kind {
            SessionKind::Hardware => &mut self.hardware,
            SessionKind::Software => &mut self.software,
        }
    }

    /// Current state, as reported by the controller.
    ///
    /// An active session the scheduler does not own is reported as
    /// [`Error::UnknownSession`].
    pub fn state<C: SessionController>(&self, controller: &C) -> Result<SchedulerState, Error> {
        let active = controller.active_session().map_err(Error::Session)?;
        match active {
            None => Ok(SchedulerState::NoSessionActive),
            Some(h) if self.hardware.is_some_and(|s| s.handle == h) => Ok(SchedulerState::HardwareActive),
            Some(h) if self.software.is_some_and(|s| s.handle == h) => Ok(SchedulerState::SoftwareActive),
            Some(h) => {
                warn!("controller reports unknown active session {:?}", h);
                Err(Error::UnknownSession(h))
            }
        }
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    /// Put the hardware session on the link.
    pub fn activate_hardware<C: SessionController>(&self, controller: &C) -> Result<(), Error> {
        let session = self.hardware.ok_or(Error::InvalidArgument)?;
        controller
            .activate_session(session.handle)
            .map_err(Error::Session)?;
        debug!("hardware session {:?} active", session.handle);
        Ok(())
    }

    /// Frame-done notification for the session of `kind`.
    ///
    /// # Panics
    /// Panics if `handle` is not the session the scheduler expects for `kind`,
    /// or if the controller rejects the switch. Both mean the controller and
    /// the scheduler disagree about which session is on the link.
    pub fn on_frame_done<C: SessionController>(&self, controller: &C, kind: SessionKind, handle: SessionHandle) {
        if self.is_stopping() {
            trace!("{:?} frame done ignored, stop in progress", kind);
            return;
        }

        let (from, to) = match kind {
            SessionKind::Hardware => (self.hardware, self.software),
            SessionKind::Software => (self.software, self.hardware),
        };
        let Some(from) = from else {
            panic!("{:?} frame done with no {:?} session", kind, kind);
        };
        assert_eq!(from.handle, handle, "{:?} frame done for an unexpected session", kind);

        // Without a software session the hardware session keeps re-arming itself.
        let Some(to) = to else {
            trace!("{:?} frame done, no hand-off", kind);
            return;
        };
        if let Err(err) = controller.deactivate_session(from.handle) {
            panic!("deactivating {:?} session failed: {}", kind, err);
        }
        if let Err(err) = controller.activate_session(to.handle) {
            panic!("activating {:?} session failed: {}", to.kind(), err);
        }
        trace!("link handed from {:?} to {:?}", kind, to.kind());
    }

    /// Raise the stop flag. Frame-done signals are ignored until
    /// [`finish_stop`](Self::finish_stop).
    pub fn begin_stop(&self) {
        self.stopping.store(true, Ordering::Release);
    }

    pub fn finish_stop(&self) {
        self.stopping.store(false, Ordering::Release);
    }

    /// Take whatever session is on the link off it.
    ///
    /// The query and the deactivation run in one critical section so that a
    /// frame-done switch cannot slip in between them.
    pub fn deactivate_active<C: SessionController>(
        &self,
        controller: &C,
    ) -> Result<Option<SessionHandle>, Error> {
        critical_section::with(|_| {
            let active = controller.active_session().map_err(Error::Session)?;
            if let Some(handle) = active {
                controller
                    .deactivate_session(handle)
                    .map_err(Error::Session)?;
            }
            Ok(active)
        })
    }
}

impl Default for SessionScheduler {
    fn default() -> Self {
        Self::new()
    }
}
