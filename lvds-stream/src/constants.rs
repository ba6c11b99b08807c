/// Default size in bytes of the capture region placed in `.dataCubeMemory`.
pub const MEM_CAPTURE_SIZE: usize = 16 * 1024;

/// Byte written over the whole capture region on every start.
pub const CAPTURE_FILL_PATTERN: u8 = 0xCC;

/// Number of receive channels on the front end.
pub const NUM_RX_CHANNELS: usize = 4;

/// Number of chirp-quality (monitor) queues streamed by the hardware session.
pub const MAX_CQ: usize = 3;

/// Number of DMA channels in the transfer controller; param slots above this are link-only.
pub const NUM_DMA_CHANNELS: u16 = 64;

/// DMA channels reserved for the hardware session.
pub const HW_SESSION_MAX_DMA_CHANNELS: usize = 13;

/// DMA channels reserved for the software session.
pub const SW_SESSION_MAX_DMA_CHANNELS: usize = 3;

/// Maximum number of concurrent streaming sessions on the link.
pub const MAX_SESSIONS: u8 = 2;

/// First command code owned by this profile in the framework's command space.
pub const PROFILE_COMMAND_BASE: u32 = 0x100;
