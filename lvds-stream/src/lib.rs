//! # lvds-stream
//!
//! A `no_std`, zero-allocation capture and streaming engine for mmWave radar
//! sensors. Once per chirp it moves ADC samples from the capture peripheral
//! into a fixed memory region with a self-linked DMA transfer. It also drives
//! the LVDS link through a session controller. The link alternates, frame by
//! frame, between a hardware session streaming live ADC data and an optional
//! software session streaming user buffers.
//!
//! ## Architecture
//!
//! | Layer | Module | Purpose |
//! |-------|--------|---------|
//! | Contracts | [`driver`] | `SessionController`, `DmaEngine` and `HeaderBuilder` traits |
//! | Resources | [`channel`] | Fixed DMA channel tables and the pool sessions draw from |
//! | Configuration | [`config`] / [`command`] | Device presets, profile settings, control commands |
//! | Sessions | [`session`] | Geometry validation, session building, hand-off scheduling |
//! | Capture | [`capture`] | Capture region and write-pointer tracking |
//! | Lifecycle | [`profile`] | `init` / `open` / `finalize_cfg` / `start` / `stop` / `close` / `deinit` |
//!
//! ## Quick start
//!
//! ```ignore
//! use lvds_stream::{InitConfig, Profile, CaptureRegion, Device, OpenConfig};
//!
//! let region = CaptureRegion::new(CAPTURE_MEMORY, capture_dma_address);
//! let mut profile = Profile::init(InitConfig { device: Device::Xwr18xx, region }, cbuff, edma, hsi);
//!
//! profile.open(&OpenConfig { adc_bits: 2 })?;
//! profile.set_chirps_per_frame(128);
//! profile.finalize_cfg(&acquisition)?;
//! profile.start()?;
//!
//! // Chirp-available ISR:      profile.chirp_available();
//! // Capture DMA ISR:          profile.transfer_complete();
//! // Session frame-done ISR:   profile.frame_done(kind, handle);
//! loop {
//!     profile.execute()?;
//! }
//! ```
//!
//! ## Capture parameters
//!
//! - **Capture region:** 16 KiB by default ([`constants::MEM_CAPTURE_SIZE`])
//! - **Sessions:** at most 2 on the link, one active ([`constants::MAX_SESSIONS`])
//! - **DMA channels:** 13 for the hardware session, 3 for the software session

#![cfg_attr(not(test), no_std)]

pub mod constants;
pub mod error;
pub mod config;
pub mod driver;
pub mod channel;
pub mod session;
pub mod capture;
pub mod command;
pub mod profile;

#[cfg(test)]
mod sim;


pub use capture::{CaptureRegion, CaptureTracker};
pub use command::{Command, CommandCode};
pub use config::{AcquisitionConfig, Device, OpenConfig, ProfileConfig};
pub use error::{DriverError, Error};
pub use profile::{ChirpOutcome, InitConfig, Parts, Profile, ProfileState, Statistics};
