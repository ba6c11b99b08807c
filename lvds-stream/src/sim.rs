//! Host-side software models of the driver contracts, for tests.
//!
//! The models enforce the same rules as the real drivers where the profile
//! depends on them: one active session at a time, only the active session can
//! be deactivated, active sessions cannot be deleted, and a header slot must
//! be released before it is reused. Every call is recorded so tests can check
//! ordering.

use std::sync::{Mutex, MutexGuard};
use std::vec::Vec;

use crate::channel::{ChannelAllocator, ChannelDescriptor};
use crate::config::LinkConfig;
use crate::driver::{
    ChannelConfig, DmaAddress, DmaEngine, HeaderBlock, HeaderBuilder, ParamSet, SessionConfig,
    SessionController, SessionHandle, SessionKind, StreamStats,
};
use crate::error::DriverError;

/// Status returned by the models for a rule violation.
pub const SIM_REJECTED: DriverError = DriverError(-1);
/// Status returned by the models for an injected fault.
pub const SIM_FAULT: DriverError = DriverError(-99);

// ── Session controller ─────────────────────────────────────────────────────

/// Session controller call, as recorded by [`SimController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Init,
    Deinit,
    Create(SessionKind, SessionHandle),
    Delete(SessionHandle),
    Activate(SessionHandle),
    Deactivate(SessionHandle),
    ClearStats,
}

/// Controller operation a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Create,
    Activate,
    Deactivate,
    QueryActive,
    Stats,
}

#[derive(Debug)]
struct SimSession {
    handle: SessionHandle,
    config: SessionConfig,
    channels: Vec<ChannelDescriptor>,
}

#[derive(Debug)]
struct ControllerInner {
    initialized: bool,
    link: Option<LinkConfig>,
    next_id: u32,
    sessions: Vec<SimSession>,
    active: Option<SessionHandle>,
    events: Vec<Event>,
    stats: StreamStats,
    hw_channels: usize,
    sw_channels: usize,
    fault: Option<Fault>,
}

/// Software model of the session controller.
#[derive(Debug)]
pub struct SimController {
    inner: Mutex<ControllerInner>,
}

impl SimController {
    pub fn new() -> Self {
        SimController {
            inner: Mutex::new(ControllerInner {
                initialized: false,
                link: None,
                next_id: 1,
                sessions: Vec::new(),
                active: None,
                events: Vec::new(),
                stats: StreamStats::default(),
                hw_channels: 2,
                sw_channels: 1,
                fault: None,
            }),
        }
    }

    /// A controller that has already been initialized.
    pub fn ready() -> Self {
        let c = Self::new();
        c.lock().initialized = true;
        c
    }

    fn lock(&self) -> MutexGuard<'_, ControllerInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// DMA channels each new session of `kind` draws from the pool.
    pub fn set_channels_per_session(&self, kind: SessionKind, n: usize) {
        let mut inner = self.lock();
        match kind {
            SessionKind::Hardware => inner.hw_channels = n,
            SessionKind::Software => inner.sw_channels = n,
        }
    }

    /// Make the next call of `op` fail with [`SIM_FAULT`].
    pub fn inject_fault(&self, op: Fault) {
        self.lock().fault = Some(op);
    }

    pub fn set_stats(&self, stats: StreamStats) {
        self.lock().stats = stats;
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn link(&self) -> Option<LinkConfig> {
        self.lock().link
    }

    /// Number of sessions currently created.
    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    /// Descriptor a live session was created from.
    pub fn session_config(&self, handle: SessionHandle) -> Option<SessionConfig> {
        self.lock()
            .sessions
            .iter()
            .find(|s| s.handle == handle)
            .map(|s| s.config)
    }
}

impl Default for SimController {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerInner {
    fn take_fault(&mut self, op: Fault) -> Result<(), DriverError> {
        if self.fault == Some(op) {
            self.fault = None;
            return Err(SIM_FAULT);
        }
        Ok(())
    }
}

impl SessionController for SimController {
    fn init(&mut self, link: &LinkConfig) -> Result<(), DriverError> {
        let inner = self.inner.get_mut().unwrap_or_else(|p| p.into_inner());
        if inner.initialized {
            return Err(SIM_REJECTED);
        }
        inner.initialized = true;
        inner.link = Some(*link);
        inner.events.push(Event::Init);
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), DriverError> {
        let inner = self.inner.get_mut().unwrap_or_else(|p| p.into_inner());
        if !inner.initialized || !inner.sessions.is_empty() {
            return Err(SIM_REJECTED);
        }
        inner.initialized = false;
        inner.link = None;
        inner.events.push(Event::Deinit);
        Ok(())
    }

    fn create_session(
        &self,
        cfg: &SessionConfig,
        channels: &mut dyn ChannelAllocator,
    ) -> Result<SessionHandle, DriverError> {
        let mut inner = self.lock();
        if !inner.initialized {
            return Err(SIM_REJECTED);
        }
        inner.take_fault(Fault::Create)?;

        let kind = cfg.kind();
        let wanted = match kind {
            SessionKind::Hardware => inner.hw_channels,
            SessionKind::Software => inner.sw_channels,
        };
        let mut issued = Vec::with_capacity(wanted);
        for _ in 0..wanted {
            match channels.allocate(kind) {
                Ok(channel) => issued.push(channel),
                Err(_) => {
                    for channel in issued.iter().rev() {
                        channels.free(channel);
                    }
                    return Err(SIM_REJECTED);
                }
            }
        }

        let handle = SessionHandle::new(inner.next_id);
        inner.next_id += 1;
        inner.sessions.push(SimSession {
            handle,
            config: *cfg,
            channels: issued,
        });
        inner.events.push(Event::Create(kind, handle));
        Ok(handle)
    }

    fn delete_session(
        &self,
        session: SessionHandle,
        channels: &mut dyn ChannelAllocator,
    ) -> Result<(), DriverError> {
        let mut inner = self.lock();
        if inner.active == Some(session) {
            return Err(SIM_REJECTED);
        }
        let Some(pos) = inner.sessions.iter().position(|s| s.handle == session) else {
            return Err(SIM_REJECTED);
        };
        let removed = inner.sessions.remove(pos);
        for channel in removed.channels.iter().rev() {
            channels.free(channel);
        }
        inner.events.push(Event::Delete(session));
        Ok(())
    }

    fn activate_session(&self, session: SessionHandle) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.take_fault(Fault::Activate)?;
        if inner.active.is_some() || !inner.sessions.iter().any(|s| s.handle == session) {
            return Err(SIM_REJECTED);
        }
        inner.active = Some(session);
        inner.events.push(Event::Activate(session));
        Ok(())
    }

    fn deactivate_session(&self, session: SessionHandle) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.take_fault(Fault::Deactivate)?;
        if inner.active != Some(session) {
            return Err(SIM_REJECTED);
        }
        inner.active = None;
        inner.events.push(Event::Deactivate(session));
        Ok(())
    }

    fn active_session(&self) -> Result<Option<SessionHandle>, DriverError> {
        let mut inner = self.lock();
        inner.take_fault(Fault::QueryActive)?;
        Ok(inner.active)
    }

    fn stats(&self) -> Result<StreamStats, DriverError> {
        let mut inner = self.lock();
        inner.take_fault(Fault::Stats)?;
        Ok(inner.stats)
    }

    fn clear_stats(&self) -> Result<(), DriverError> {
        let mut inner = self.lock();
        inner.stats = StreamStats::default();
        inner.events.push(Event::ClearStats);
        Ok(())
    }
}

// ── DMA engine ─────────────────────────────────────────────────────────────

/// DMA engine call, as recorded by [`SimDma`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaCall {
    Disable(u8),
    ConfigureChannel(ChannelConfig),
    ConfigureParamSet(u16, ParamSet),
    Link(u16, u16),
    SetDestination(u8, DmaAddress),
    Start(u8),
}

/// Software model of the DMA engine. Records calls; never moves data.
#[derive(Debug, Default)]
pub struct SimDma {
    calls: Mutex<Vec<DmaCall>>,
    fail_start: Mutex<bool>,
}

impl SimDma {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: DmaCall) {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(call);
    }

    pub fn calls(&self) -> Vec<DmaCall> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }

    /// Number of transfers started so far.
    pub fn transfers_started(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, DmaCall::Start(_)))
            .count()
    }

    /// Make the next `start_transfer` fail with [`SIM_FAULT`].
    pub fn fail_next_start(&self) {
        *self.fail_start.lock().unwrap_or_else(|p| p.into_inner()) = true;
    }
}

impl DmaEngine for SimDma {
    fn disable_channel(&self, channel: u8) -> Result<(), DriverError> {
        self.record(DmaCall::Disable(channel));
        Ok(())
    }

    fn configure_channel(&self, cfg: &ChannelConfig) -> Result<(), DriverError> {
        self.record(DmaCall::ConfigureChannel(*cfg));
        Ok(())
    }

    fn configure_param_set(&self, param_id: u16, params: &ParamSet) -> Result<(), DriverError> {
        self.record(DmaCall::ConfigureParamSet(param_id, *params));
        Ok(())
    }

    fn link_param_sets(&self, from: u16, to: u16) -> Result<(), DriverError> {
        self.record(DmaCall::Link(from, to));
        Ok(())
    }

    fn set_destination_address(&self, channel: u8, address: DmaAddress) -> Result<(), DriverError> {
        self.record(DmaCall::SetDestination(channel, address));
        Ok(())
    }

    fn start_transfer(&self, channel: u8) -> Result<(), DriverError> {
        let mut fail = self.fail_start.lock().unwrap_or_else(|p| p.into_inner());
        if *fail {
            *fail = false;
            return Err(SIM_FAULT);
        }
        drop(fail);
        self.record(DmaCall::Start(channel));
        Ok(())
    }
}

// ── Header subsystem ───────────────────────────────────────────────────────

/// Header size in link units.
pub const SIM_HEADER_UNITS: u32 = 26;

/// Software model of the header subsystem.
#[derive(Debug, Default)]
pub struct SimHeaders {
    initialized: bool,
    slots: [Option<HeaderBlock>; 2],
    created: u32,
    deleted: u32,
}

impl SimHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(kind: SessionKind) -> usize {
        match kind {
            SessionKind::Hardware => 0,
            SessionKind::Software => 1,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Headers created and deleted so far.
    pub fn counts(&self) -> (u32, u32) {
        (self.created, self.deleted)
    }

    pub fn is_held(&self, kind: SessionKind) -> bool {
        self.slots[Self::slot(kind)].is_some()
    }
}

impl HeaderBuilder for SimHeaders {
    fn init(&mut self, _link: &LinkConfig) -> Result<(), DriverError> {
        self.initialized = true;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), DriverError> {
        if self.slots.iter().any(Option::is_some) {
            return Err(SIM_REJECTED);
        }
        self.initialized = false;
        Ok(())
    }

    fn create_header(&mut self, session: &SessionConfig) -> Result<(), DriverError> {
        let slot = &mut self.slots[Self::slot(session.kind())];
        if slot.is_some() {
            return Err(SIM_REJECTED);
        }
        *slot = Some(HeaderBlock {
            address: 0x2300_0000 + 0x100 * Self::slot(session.kind()) as u32,
            size: SIM_HEADER_UNITS,
        });
        self.created += 1;
        Ok(())
    }

    fn delete_header(&mut self, kind: SessionKind) -> Result<(), DriverError> {
        if self.slots[Self::slot(kind)].take().is_none() {
            return Err(SIM_REJECTED);
        }
        self.deleted += 1;
        Ok(())
    }

    fn header_block(&self, kind: SessionKind) -> HeaderBlock {
        self.slots[Self::slot(kind)].unwrap_or(HeaderBlock { address: 0, size: 0 })
    }

    /// The link moves 16-bit words.
    fn to_link_units(&self, bytes: u32) -> u32 {
        bytes / 2
    }
}
