//! The LVDS stream profile: lifecycle, control and interrupt entry points.
//!
//! ```text
//! init ─► Initialized ─open─► Opened ─finalize_cfg─► Configured ─start─► Started
//!                               ▲                       ▲   ▲              │
//!                               │                       │   └──start───┐  stop
//!                             close ◄── Closed     finalize_cfg        │   ▼
//!                                                       └──────────── Stopped
//! ```
//!
//! [`Profile::init`] creates the instance and [`Profile::deinit`] consumes it,
//! so the uninitialized and deinitialized states are never observable.
//!
//! ## Entry points by context
//!
//! | Context | Methods |
//! |---------|---------|
//! | Framework task | `open`, `finalize_cfg`, `control`, `start`, `close`, `deinit` |
//! | Polling loop | [`execute`](Profile::execute), [`stop`](Profile::stop) |
//! | Chirp-available ISR | [`chirp_available`](Profile::chirp_available) |
//! | DMA-completion ISR | [`transfer_complete`](Profile::transfer_complete) |
//! | Session frame-done ISR | [`frame_done`](Profile::frame_done) |
//!
//! Methods callable from interrupt context take `&self` and never block.

use core::cell::Cell;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::Mutex;
use log::{debug, info, trace, warn};

use crate::capture::{CaptureRegion, CaptureTracker};
use crate::channel::{ChannelPool, CAPTURE_CHANNEL_ID};
use crate::command::Command;
use crate::config::{
    AcquisitionConfig, DataFormat, Device, LinkConfig, OpenConfig, OutputDataFormat,
    ProfileConfig, UserBufferConfig,
};
use crate::constants::{CAPTURE_FILL_PATTERN, MAX_CQ};
use crate::driver::{
    DmaEngine, HeaderBuilder, SessionController, SessionHandle, SessionKind, StreamStats,
};
use crate::error::Error;
use crate::session::{builder, SchedulerState, SessionScheduler, TransferGeometry};

/// Lifecycle state of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProfileState {
    Initialized = 0,
    Opened = 1,
    Configured = 2,
    Started = 3,
    Stopped = 4,
    Closed = 5,
}

impl ProfileState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => ProfileState::Initialized,
            1 => ProfileState::Opened,
            2 => ProfileState::Configured,
            3 => ProfileState::Started,
            4 => ProfileState::Stopped,
            5 => ProfileState::Closed,
            _ => unreachable!("corrupt profile state {}", raw),
        }
    }
}

/// What [`Profile::execute`] did with the current poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChirpOutcome {
    /// No chirp was pending.
    Idle,
    /// A capture transfer was started.
    Triggered,
    /// A chirp was pending but the capture region is full.
    BufferFull,
}

/// Counters for the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Chirp-available interrupts since start.
    pub chirps_available: u32,
    /// Capture DMA completions since start.
    pub dma_completions: u32,
    /// Bytes written into the capture region since start.
    pub bytes_captured: u32,
    /// Controller statistics as of the last processed chirp.
    pub stream: StreamStats,
}

/// Arguments to [`Profile::init`].
pub struct InitConfig {
    pub device: Device,
    /// Destination of the capture DMA.
    pub region: CaptureRegion,
}

/// Driver handles and capture region released by [`Profile::deinit`].
pub struct Parts<C, D, H> {
    pub controller: C,
    pub dma: D,
    pub headers: H,
    pub region: CaptureRegion,
}

/// ADC capture and LVDS streaming profile.
pub struct Profile<C, D, H> {
    device: Device,
    controller: C,
    dma: D,
    headers: H,
    region: CaptureRegion,
    pool: ChannelPool,
    scheduler: SessionScheduler,
    tracker: CaptureTracker,
    config: ProfileConfig,
    geometry: Option<TransferGeometry>,
    link: Option<LinkConfig>,
    last_stats: Mutex<Cell<StreamStats>>,
    state: AtomicU8,
}

impl<C, D, H> Profile<C, D, H>
where
    C: SessionController,
    D: DmaEngine,
    H: HeaderBuilder,
{
    /// Create the profile with the default configuration: no header, no
    /// user buffers, zero chirps per frame.
    pub fn init(config: InitConfig, controller: C, dma: D, headers: H) -> Self {
        info!(
            "lvds stream init: {:?}, {} byte capture region",
            config.device,
            config.region.capacity()
        );
        Profile {
            device: config.device,
            controller,
            dma,
            headers,
            region: config.region,
            pool: ChannelPool::new(),
            scheduler: SessionScheduler::new(),
            tracker: CaptureTracker::new(),
            config: ProfileConfig::default(),
            geometry: None,
            link: None,
            last_stats: Mutex::new(Cell::new(StreamStats::default())),
            state: AtomicU8::new(ProfileState::Initialized as u8),
        }
    }

    // ── Lifecycle ──────────────────────────────────────────────────────────

    /// Bring up the session controller and header subsystem for the LVDS link.
    pub fn open(&mut self, cfg: &OpenConfig) -> Result<(), Error> {
        self.require("open", &[ProfileState::Initialized, ProfileState::Closed])?;
        let output_format = OutputDataFormat::try_from(cfg.adc_bits).map_err(|err| {
            warn!("unsupported ADC output width code {}", cfg.adc_bits);
            err
        })?;

        let link = LinkConfig::lvds(self.device, output_format);
        self.controller.init(&link).map_err(Error::Session)?;
        self.headers.init(&link).map_err(Error::Header)?;
        self.link = Some(link);
        self.set_state(ProfileState::Opened);
        info!("lvds stream open: {:?} output", output_format);
        Ok(())
    }

    /// Validate `acq` against the profile configuration, then rebuild the
    /// capture DMA and the streaming sessions.
    ///
    /// A rejected configuration leaves everything untouched. A driver failure
    /// after validation leaves the profile unconfigured.
    pub fn finalize_cfg(&mut self, acq: &AcquisitionConfig) -> Result<(), Error> {
        self.require(
            "finalize_cfg",
            &[ProfileState::Opened, ProfileState::Configured, ProfileState::Stopped],
        )?;
        let geometry = builder::derive_geometry(acq, &self.config, self.device)?;

        self.geometry = None;
        self.set_state(ProfileState::Opened);

        self.dma
            .disable_channel(CAPTURE_CHANNEL_ID)
            .map_err(Error::Dma)?;
        self.teardown_sessions()?;

        builder::program_capture_channel(
            &self.dma,
            &geometry,
            self.device.adc_base_address(),
            self.region.dma_address(),
        )?;

        let enable_header = self.config.enable_header;
        let hw = builder::hardware_session(acq, &self.config);
        let hw = builder::create_session(&self.controller, &mut self.headers, &mut self.pool, hw, enable_header)?;
        *self.scheduler.slot_mut(SessionKind::Hardware) = Some(hw);

        if self.config.user_buffers.is_streamed() {
            let sw = builder::software_session(&self.config, &self.headers);
            let sw = builder::create_session(&self.controller, &mut self.headers, &mut self.pool, sw, enable_header)?;
            *self.scheduler.slot_mut(SessionKind::Software) = Some(sw);
        }

        self.geometry = Some(geometry);
        self.set_state(ProfileState::Configured);
        info!(
            "lvds stream configured: {} byte blocks, software session {}",
            geometry.block_size,
            if self.scheduler.software().is_some() { "on" } else { "off" }
        );
        Ok(())
    }

    /// Arm the capture region and put the hardware session on the link.
    pub fn start(&mut self) -> Result<(), Error> {
        self.require("start", &[ProfileState::Configured, ProfileState::Stopped])?;
        let Some(geometry) = self.geometry else {
            return Err(self.invalid_state("start"));
        };

        self.tracker.arm(
            self.region.dma_address(),
            self.region.capacity(),
            geometry.block_size,
        );
        self.region.fill(CAPTURE_FILL_PATTERN);
        critical_section::with(|cs| self.last_stats.borrow(cs).set(StreamStats::default()));

        self.scheduler.activate_hardware(&self.controller)?;
        self.set_state(ProfileState::Started);
        info!("lvds stream started");
        Ok(())
    }

    /// Take the active session off the link.
    ///
    /// Frame-done signals are ignored for the duration. An in-flight capture
    /// transfer is left to complete on its own.
    pub fn stop(&self) -> Result<(), Error> {
        self.require("stop", &[ProfileState::Started])?;

        self.scheduler.begin_stop();
        // On failure the stop flag stays raised until a retried stop succeeds.
        let deactivated = self.scheduler.deactivate_active(&self.controller)?;
        self.controller.clear_stats().map_err(Error::Session)?;
        self.scheduler.finish_stop();

        self.set_state(ProfileState::Stopped);
        info!(
            "lvds stream stopped: deactivated {:?}, {} bytes captured",
            deactivated,
            self.tracker.bytes_captured()
        );
        Ok(())
    }

    /// Delete the sessions and shut down the header subsystem and session controller.
    pub fn close(&mut self) -> Result<(), Error> {
        self.require(
            "close",
            &[ProfileState::Opened, ProfileState::Configured, ProfileState::Stopped],
        )?;

        self.teardown_sessions()?;
        self.geometry = None;
        self.headers.deinit().map_err(Error::Header)?;
        self.controller.deinit().map_err(Error::Session)?;
        self.link = None;
        self.set_state(ProfileState::Closed);
        info!("lvds stream closed");
        Ok(())
    }

    /// Consume the profile and hand back the drivers and capture region.
    pub fn deinit(self) -> Parts<C, D, H> {
        let state = self.state();
        if !matches!(state, ProfileState::Initialized | ProfileState::Closed) {
            warn!("lvds stream deinit while {:?}", state);
        }
        info!("lvds stream deinit");
        Parts {
            controller: self.controller,
            dma: self.dma,
            headers: self.headers,
            region: self.region,
        }
    }

    fn teardown_sessions(&mut self) -> Result<(), Error> {
        for kind in [SessionKind::Hardware, SessionKind::Software] {
            builder::teardown_session(
                &self.controller,
                &mut self.headers,
                &mut self.pool,
                self.scheduler.slot_mut(kind),
            )?;
        }
        Ok(())
    }

    // ── Configuration ──────────────────────────────────────────────────────

    /// Decode and apply an opaque framework command.
    ///
    /// Changes take effect at the next [`finalize_cfg`](Self::finalize_cfg).
    pub fn control(&mut self, code: u32, payload: &[u8]) -> Result<(), Error> {
        let command = Command::decode(code, payload).map_err(|err| {
            warn!("rejected command {:#x} ({} byte payload): {}", code, payload.len(), err);
            err
        })?;
        self.apply(command);
        Ok(())
    }

    pub fn apply(&mut self, command: Command) {
        debug!("apply {:?}", command);
        match command {
            Command::SetChirpsPerFrame(n) => self.set_chirps_per_frame(n),
            Command::SetDataFormat(fmt) => self.set_data_format(fmt),
            Command::SetUserBuffers(buffers) => self.set_user_buffers(buffers),
            Command::SetHeaderMode(on) => self.set_header_mode(on),
            Command::SetCqSize(sizes) => self.set_cq_size(sizes),
        }
    }

    pub fn set_chirps_per_frame(&mut self, n: u32) {
        self.config.num_chirps_per_frame = n;
    }

    pub fn set_data_format(&mut self, format: DataFormat) {
        self.config.hw_session_data_format = format;
    }

    pub fn set_user_buffers(&mut self, buffers: UserBufferConfig) {
        self.config.user_buffers = buffers;
    }

    pub fn set_header_mode(&mut self, enable: bool) {
        self.config.enable_header = enable;
    }

    pub fn set_cq_size(&mut self, sizes: [u16; MAX_CQ]) {
        self.config.cq_size = sizes;
    }

    // ── Run time ───────────────────────────────────────────────────────────

    /// Process a pending chirp: start one capture transfer if there is room.
    ///
    /// # Panics
    /// Panics if a chirp is pending while the previous transfer is still in
    /// flight.
    pub fn execute(&self) -> Result<ChirpOutcome, Error> {
        if !self.tracker.take_chirp() {
            return Ok(ChirpOutcome::Idle);
        }
        self.tracker.assert_idle();

        let stats = self.controller.stats().map_err(Error::Session)?;
        critical_section::with(|cs| self.last_stats.borrow(cs).set(stats));

        let Some(destination) = self.tracker.next_destination() else {
            trace!("capture region full, chirp dropped");
            return Ok(ChirpOutcome::BufferFull);
        };
        self.dma
            .set_destination_address(CAPTURE_CHANNEL_ID, destination)
            .map_err(Error::Dma)?;
        self.dma
            .start_transfer(CAPTURE_CHANNEL_ID)
            .map_err(Error::Dma)?;
        self.tracker.mark_in_flight();
        trace!("capture transfer to {:#010x}", destination);
        Ok(ChirpOutcome::Triggered)
    }

    /// Chirp-available interrupt.
    #[inline]
    pub fn chirp_available(&self) {
        self.tracker.notify_chirp();
    }

    /// Capture DMA completion interrupt.
    #[inline]
    pub fn transfer_complete(&self) {
        self.tracker.complete();
    }

    /// Session frame-done interrupt for the session created as `kind`.
    ///
    /// # Panics
    /// Panics if `session` is not the expected session for `kind`.
    pub fn frame_done(&self, kind: SessionKind, session: SessionHandle) {
        self.scheduler.on_frame_done(&self.controller, kind, session);
    }

    // ── Accessors ──────────────────────────────────────────────────────────

    pub fn state(&self) -> ProfileState {
        ProfileState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Which session the controller reports on the link.
    pub fn scheduler_state(&self) -> Result<SchedulerState, Error> {
        self.scheduler.state(&self.controller)
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            chirps_available: self.tracker.chirps(),
            dma_completions: self.tracker.completions(),
            bytes_captured: self.tracker.bytes_captured(),
            stream: critical_section::with(|cs| self.last_stats.borrow(cs).get()),
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn config(&self) -> &ProfileConfig {
        &self.config
    }

    /// Geometry of the last successful [`finalize_cfg`](Self::finalize_cfg).
    pub fn geometry(&self) -> Option<TransferGeometry> {
        self.geometry
    }

    /// Link parameters, once opened.
    pub fn link(&self) -> Option<&LinkConfig> {
        self.link.as_ref()
    }

    /// Handle of the session created as `kind`, if any.
    pub fn session(&self, kind: SessionKind) -> Option<SessionHandle> {
        match kind {
            SessionKind::Hardware => self.scheduler.hardware(),
            SessionKind::Software => self.scheduler.software(),
        }
        .map(|s| s.handle)
    }

    pub fn capture(&self) -> &[u8] {
        self.region.as_slice()
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn dma(&self) -> &D {
        &self.dma
    }

    pub fn headers(&self) -> &H {
        &self.headers
    }

    // ── State helpers ──────────────────────────────────────────────────────

    fn set_state(&self, state: ProfileState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn require(&self, operation: &'static str, allowed: &[ProfileState]) -> Result<(), Error> {
        if allowed.contains(&self.state()) {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    fn invalid_state(&self, operation: &'static str) -> Error {
        let state = self.state();
        warn!("{} rejected in state {:?}", operation, state);
        Error::InvalidState { operation, state }
    }
}
