//! Profile, acquisition and link configuration.

use crate::constants::{MAX_CQ, MAX_SESSIONS, NUM_RX_CHANNELS};
use crate::driver::DataMode;
use crate::error::Error;

// ── Device ─────────────────────────────────────────────────────────────────

/// Supported radar devices, as seen from the master subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Xwr14xx,
    Xwr16xx,
    Xwr18xx,
    Xwr68xx,
}

impl Device {
    /// DMA address of the capture peripheral (ADC buffer).
    pub const fn adc_base_address(self) -> u32 {
        // Same MSS mapping on every supported part.
        0x5208_0000
    }

    /// Fixed capacity of the capture peripheral in bytes. One DMA block may
    /// never be larger than this.
    pub const fn adc_buffer_size(self) -> u32 {
        match self {
            Device::Xwr14xx => 0x4000,
            Device::Xwr16xx | Device::Xwr18xx | Device::Xwr68xx => 0x8000,
        }
    }

    /// LVDS lanes driven by the link.
    pub const fn lvds_lane_enable(self) -> u8 {
        match self {
            Device::Xwr14xx => 0xF,
            Device::Xwr16xx | Device::Xwr18xx | Device::Xwr68xx => 0x3,
        }
    }
}

// ── Open / link configuration ──────────────────────────────────────────────

/// Configuration passed to [`Profile::open`](crate::Profile::open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenConfig {
    /// ADC output width code: 0 = 12 bit, 1 = 14 bit, 2 = 16 bit.
    pub adc_bits: u8,
}

/// Bit width of the samples on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDataFormat {
    Bits12,
    Bits14,
    Bits16,
}

impl TryFrom<u8> for OutputDataFormat {
    type Error = Error;

    fn try_from(adc_bits: u8) -> Result<Self, Error> {
        match adc_bits {
            0 => Ok(OutputDataFormat::Bits12),
            1 => Ok(OutputDataFormat::Bits14),
            2 => Ok(OutputDataFormat::Bits16),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Physical link driven by the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interface {
    Lvds,
}

/// Link bring-up parameters handed to the session controller and header subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    pub interface: Interface,
    pub output_format: OutputDataFormat,
    pub max_sessions: u8,
    pub enable_ecc: bool,
    pub crc_enable: bool,
    pub enable_debug_mode: bool,
    pub lvds_crc_enable: bool,
    pub msb_first: bool,
    pub lane_enable: u8,
    pub ddr_clock_mode: bool,
    pub ddr_clock_mode_mux: bool,
}

impl LinkConfig {
    /// LVDS link configuration for `device` at the given output width.
    pub fn lvds(device: Device, output_format: OutputDataFormat) -> Self {
        LinkConfig {
            interface: Interface::Lvds,
            output_format,
            max_sessions: MAX_SESSIONS,
            enable_ecc: false,
            crc_enable: true,
            enable_debug_mode: false,
            lvds_crc_enable: false,
            msb_first: true,
            lane_enable: device.lvds_lane_enable(),
            ddr_clock_mode: true,
            ddr_clock_mode_mux: true,
        }
    }
}

// ── Acquisition configuration (owned by the framework) ─────────────────────

/// Data output mode of the radar front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Frame-based chirping; `num_adc_samples` per chirp.
    Frame { num_adc_samples: u16 },
    /// Continuous streaming; `transfer_size` samples per transfer.
    Continuous { transfer_size: u16 },
    /// Advanced frame configuration. Not handled by this profile.
    AdvancedFrame,
}

/// ADC sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcFormat {
    /// I/Q pairs, 4 bytes per sample.
    Complex,
    /// Real samples, 2 bytes per sample.
    Real,
}

impl AdcFormat {
    pub const fn bytes_per_sample(self) -> u32 {
        match self {
            AdcFormat::Complex => 4,
            AdcFormat::Real => 2,
        }
    }
}

/// Acquisition settings supplied by the framework at finalize time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    pub mode: OutputMode,
    /// Bit N set enables receive channel N.
    pub rx_channel_enable: u8,
    pub adc_format: AdcFormat,
    pub data_mode: DataMode,
    /// Chirps aggregated into one DMA block.
    pub chirp_threshold: u8,
}

impl AcquisitionConfig {
    /// Number of enabled receive channels.
    pub fn active_rx_channels(&self) -> u32 {
        (0..NUM_RX_CHANNELS)
            .filter(|ch| self.rx_channel_enable & (1 << ch) != 0)
            .count() as u32
    }
}

// ── Profile configuration (mutated by control commands) ────────────────────

/// Data format streamed by the hardware session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DataFormat {
    /// ADC samples only.
    AdcData = 0,
    /// Chirp parameters followed by ADC samples.
    CpAdc = 1,
    /// ADC samples followed by chirp parameters.
    AdcCp = 2,
    /// Chirp parameters, ADC samples, chirp quality.
    CpAdcCq = 3,
    /// ADC samples followed by user data.
    AdcUser = 4,
    /// Chirp parameters, ADC samples, chirp quality, user data.
    CpAdcCqUser = 5,
}

impl TryFrom<u32> for DataFormat {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self, Error> {
        match code {
            0 => Ok(DataFormat::AdcData),
            1 => Ok(DataFormat::CpAdc),
            2 => Ok(DataFormat::AdcCp),
            3 => Ok(DataFormat::CpAdcCq),
            4 => Ok(DataFormat::AdcUser),
            5 => Ok(DataFormat::CpAdcCqUser),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// A user buffer to stream through the software session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserBuffer {
    /// DMA-visible address of the buffer.
    pub address: u32,
    /// Size in bytes.
    pub size: u32,
}

/// Up to two user buffers streamed after every hardware frame.
///
/// The software session exists only when `buffer1` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserBufferConfig {
    pub buffer1: Option<UserBuffer>,
    pub buffer2: Option<UserBuffer>,
}

impl UserBufferConfig {
    /// Whether a software session has to be created.
    pub fn is_streamed(&self) -> bool {
        self.buffer1.is_some()
    }
}

/// Profile configuration set through control commands before finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileConfig {
    pub num_chirps_per_frame: u32,
    pub hw_session_data_format: DataFormat,
    pub user_buffers: UserBufferConfig,
    pub enable_header: bool,
    /// Monitor queue sizes, in link units.
    pub cq_size: [u16; MAX_CQ],
}

impl Default for ProfileConfig {
    fn default() -> Self {
        ProfileConfig {
            num_chirps_per_frame: 0,
            hw_session_data_format: DataFormat::AdcData,
            user_buffers: UserBufferConfig::default(),
            enable_header: false,
            cq_size: [0; MAX_CQ],
        }
    }
}
