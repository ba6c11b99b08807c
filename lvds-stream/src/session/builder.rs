//! Configuration finalization: validation, DMA geometry and session descriptors.
//!
//! Finalizing turns the framework's acquisition settings plus the profile's
//! own configuration into
//!
//! 1. a [`TransferGeometry`] for the capture DMA,
//! 2. a self-linked capture channel programmed on the [`DmaEngine`],
//! 3. a hardware session and, when user buffers are streamed, a software
//!    session created on the [`SessionController`].
//!
//! Validation is pure and runs first, so a rejected configuration never
//! touches hardware.

use log::{debug, warn};

use crate::channel::{ChannelPool, CAPTURE_CHANNEL_ID, CAPTURE_LINK_PARAM_ID};
use crate::config::{AcquisitionConfig, AdcFormat, Device, OutputMode, ProfileConfig, UserBuffer};
use crate::driver::{
    ChannelConfig, DataType, DmaAddress, DmaEngine, HardwareSessionConfig, HeaderBuilder,
    OperationalMode, ParamSet, SessionConfig, SessionController, SessionSource,
    SoftwareSessionConfig, SyncType, UserBufferInfo,
};
use crate::error::Error;

use super::Session;

/// Event queue the capture channel is submitted on.
const CAPTURE_EVENT_QUEUE: u8 = 1;

/// DMA transfer geometry derived from the acquisition settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferGeometry {
    /// Bytes moved per chirp: samples × bytes-per-sample × active channels.
    pub element_size: u32,
    /// Chirps aggregated per transfer (the chirp threshold).
    pub frame_count: u8,
    /// Bytes per transfer; the write pointer advances by this much.
    pub block_size: u32,
}

/// Validate the configuration and derive the capture geometry.
///
/// Rejections, in order:
///
/// | Condition | Error |
/// |-----------|-------|
/// | Mode other than framed / continuous | [`Error::NotSupported`] |
/// | Framed with zero chirps per frame | [`Error::InvalidArgument`] |
/// | Continuous with user buffers | [`Error::InvalidArgument`] |
/// | No receive channel enabled | [`Error::InvalidArgument`] |
/// | Zero chirp threshold | [`Error::InvalidArgument`] |
/// | Block larger than the capture peripheral | [`Error::CaptureSizeExceeded`] |
pub fn derive_geometry(
    acq: &AcquisitionConfig,
    cfg: &ProfileConfig,
    device: Device,
) -> Result<TransferGeometry, Error> {
    let samples = match acq.mode {
        OutputMode::Frame { num_adc_samples } => {
            if cfg.num_chirps_per_frame == 0 {
                warn!("frame mode requires a non-zero chirps-per-frame count");
                return Err(Error::InvalidArgument);
            }
            num_adc_samples
        }
        OutputMode::Continuous { transfer_size } => {
            // No frame-done signal in continuous mode, so the software session
            // could never be scheduled.
            if cfg.user_buffers.is_streamed() {
                warn!("user buffers cannot be streamed in continuous mode");
                return Err(Error::InvalidArgument);
            }
            transfer_size
        }
        OutputMode::AdvancedFrame => {
            warn!("unsupported output mode {:?}", acq.mode);
            return Err(Error::NotSupported);
        }
    };

    let rx_channels = acq.active_rx_channels();
    if rx_channels == 0 {
        warn!("no receive channel enabled");
        return Err(Error::InvalidArgument);
    }
    if acq.chirp_threshold == 0 {
        warn!("chirp threshold must be at least 1");
        return Err(Error::InvalidArgument);
    }

    let capacity = device.adc_buffer_size();
    let element_size = samples as u32 * acq.adc_format.bytes_per_sample() * rx_channels;
    let block_size = element_size * acq.chirp_threshold as u32;
    if block_size > capacity {
        warn!("{} byte transfer exceeds the {} byte ADC buffer", block_size, capacity);
        return Err(Error::CaptureSizeExceeded {
            requested: block_size,
            capacity,
        });
    }

    let geometry = TransferGeometry {
        element_size,
        frame_count: acq.chirp_threshold,
        block_size,
    };
    debug!("capture geometry {:?}", geometry);
    Ok(geometry)
}

/// Param set moving one block from the ADC buffer to `destination`.
pub fn capture_param_set(geometry: &TransferGeometry, source: DmaAddress, destination: DmaAddress) -> ParamSet {
    // Bounded by the capture capacity check, which is below 64 KiB on every device.
    let element = geometry.element_size as u16;
    ParamSet {
        source_address: source,
        destination_address: destination,
        a_count: element,
        b_count: geometry.frame_count as u16,
        c_count: 1,
        b_count_reload: geometry.frame_count as u16,
        source_b_index: element as i16,
        destination_b_index: element as i16,
        source_c_index: 0,
        destination_c_index: 0,
        link: None,
        sync: SyncType::AB,
        transfer_completion_code: CAPTURE_CHANNEL_ID,
        static_set: false,
        early_completion: false,
        final_interrupt: true,
        intermediate_interrupt: false,
        final_chaining: false,
        intermediate_chaining: false,
    }
}

/// Program the capture channel and its self-linked reload slot.
pub fn program_capture_channel<D: DmaEngine>(
    dma: &D,
    geometry: &TransferGeometry,
    source: DmaAddress,
    destination: DmaAddress,
) -> Result<(), Error> {
    let params = capture_param_set(geometry, source, destination);
    dma.configure_channel(&ChannelConfig {
        channel_id: CAPTURE_CHANNEL_ID,
        param_id: CAPTURE_CHANNEL_ID as u16,
        event_queue: CAPTURE_EVENT_QUEUE,
        param_set: params,
    })
    .map_err(Error::Dma)?;
    dma.configure_param_set(CAPTURE_LINK_PARAM_ID, &params)
        .map_err(Error::Dma)?;
    dma.link_param_sets(CAPTURE_CHANNEL_ID as u16, CAPTURE_LINK_PARAM_ID)
        .map_err(Error::Dma)?;
    dma.link_param_sets(CAPTURE_LINK_PARAM_ID, CAPTURE_LINK_PARAM_ID)
        .map_err(Error::Dma)?;
    Ok(())
}

/// Descriptor for the hardware (live ADC) session.
///
/// The frame-done notification is only requested when a software session
/// needs to be scheduled after each frame.
pub fn hardware_session(acq: &AcquisitionConfig, cfg: &ProfileConfig) -> SessionConfig {
    let (op_mode, num_adc_samples) = match acq.mode {
        OutputMode::Continuous { transfer_size } => (OperationalMode::Continuous, transfer_size),
        OutputMode::Frame { num_adc_samples } => (
            OperationalMode::Chirp {
                threshold: acq.chirp_threshold,
            },
            num_adc_samples,
        ),
        OutputMode::AdvancedFrame => (OperationalMode::Continuous, 0),
    };
    SessionConfig {
        data_type: match acq.adc_format {
            AdcFormat::Complex => DataType::Complex,
            AdcFormat::Real => DataType::Real,
        },
        frame_done: cfg.user_buffers.is_streamed(),
        header: None,
        source: SessionSource::Hardware(HardwareSessionConfig {
            data_mode: acq.data_mode,
            data_format: cfg.hw_session_data_format,
            num_chirps_per_frame: cfg.num_chirps_per_frame,
            cq_size: cfg.cq_size,
            op_mode,
            num_adc_samples,
        }),
    }
}

/// Descriptor for the software (user buffer) session.
pub fn software_session<H: HeaderBuilder>(cfg: &ProfileConfig, headers: &H) -> SessionConfig {
    let info = |buffer: Option<UserBuffer>| {
        buffer.map_or(UserBufferInfo::default(), |b| UserBufferInfo {
            address: b.address,
            size: headers.to_link_units(b.size),
        })
    };
    SessionConfig {
        data_type: DataType::Complex,
        frame_done: true,
        header: None,
        source: SessionSource::Software(SoftwareSessionConfig {
            user_buffers: [info(cfg.user_buffers.buffer1), info(cfg.user_buffers.buffer2)],
        }),
    }
}

/// Create a session, attaching a header first when header mode is on.
pub fn create_session<C: SessionController, H: HeaderBuilder>(
    controller: &C,
    headers: &mut H,
    pool: &mut ChannelPool,
    mut config: SessionConfig,
    enable_header: bool,
) -> Result<Session, Error> {
    let kind = config.kind();
    if enable_header {
        headers.create_header(&config).map_err(Error::Header)?;
        config.header = Some(headers.header_block(kind));
    }
    let created = controller.create_session(&config, pool).map_err(|err| {
        match pool.take_exhaustion() {
            Some(exhausted) => Error::ChannelsExhausted(exhausted),
            None => Error::Session(err),
        }
    });
    let handle = match created {
        Ok(handle) => handle,
        Err(err) => {
            // The header is attached to nothing yet; release it so the slot can be reused.
            if enable_header {
                if let Err(status) = headers.delete_header(kind) {
                    warn!("{:?} header leaked after failed session create: {}", kind, status);
                }
            }
            return Err(err);
        }
    };
    debug!("created {:?} session {:?}", kind, handle);
    Ok(Session { handle, config })
}

/// Tear down a previously created session: deactivate it if it is on the
/// link, delete it, then release its header.
pub fn teardown_session<C: SessionController, H: HeaderBuilder>(
    controller: &C,
    headers: &mut H,
    pool: &mut ChannelPool,
    slot: &mut Option<Session>,
) -> Result<(), Error> {
    let Some(session) = slot.as_ref() else {
        return Ok(());
    };
    let kind = session.kind();

    if controller.active_session().map_err(Error::Session)? == Some(session.handle) {
        controller
            .deactivate_session(session.handle)
            .map_err(Error::Session)?;
    }
    controller
        .delete_session(session.handle, pool)
        .map_err(Error::Session)?;
    let had_header = session.has_header();
    debug!("deleted {:?} session {:?}", kind, session.handle);
    *slot = None;

    if had_header {
        headers.delete_header(kind).map_err(Error::Header)?;
    }
    Ok(())
}
