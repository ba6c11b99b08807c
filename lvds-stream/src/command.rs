//! Opaque control commands delivered by the owning framework.
//!
//! Each command is a numeric code plus a fixed-size little-endian payload:
//!
//! | Code | Command | Payload |
//! |------|---------|---------|
//! | base + 0 | [`Command::SetChirpsPerFrame`] | `u32` |
//! | base + 1 | [`Command::SetDataFormat`] | `u32` format code |
//! | base + 2 | [`Command::SetUserBuffers`] | 2 × (`u32` address, `u32` size) |
//! | base + 3 | [`Command::SetHeaderMode`] | `u8`, 1 = on |
//! | base + 4 | [`Command::SetCqSize`] | 3 × `u16` |
//!
//! Decoding is all-or-nothing: an unknown code or a payload of the wrong
//! length is rejected before anything is applied.

use crate::config::{DataFormat, UserBuffer, UserBufferConfig};
use crate::constants::{MAX_CQ, PROFILE_COMMAND_BASE};
use crate::error::Error;

/// Numeric command codes understood by [`Profile::control`](crate::Profile::control).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CommandCode {
    SetChirpsPerFrame = PROFILE_COMMAND_BASE,
    SetDataFormat = PROFILE_COMMAND_BASE + 1,
    SetUserBuffers = PROFILE_COMMAND_BASE + 2,
    SetHeaderMode = PROFILE_COMMAND_BASE + 3,
    SetCqSize = PROFILE_COMMAND_BASE + 4,
}

impl CommandCode {
    /// Exact payload length in bytes.
    pub const fn payload_len(self) -> usize {
        match self {
            CommandCode::SetChirpsPerFrame | CommandCode::SetDataFormat => 4,
            CommandCode::SetUserBuffers => 16,
            CommandCode::SetHeaderMode => 1,
            CommandCode::SetCqSize => 2 * MAX_CQ,
        }
    }
}

impl TryFrom<u32> for CommandCode {
    type Error = Error;

    fn try_from(code: u32) -> Result<Self, Error> {
        Ok(match code.checked_sub(PROFILE_COMMAND_BASE) {
            Some(0) => CommandCode::SetChirpsPerFrame,
            Some(1) => CommandCode::SetDataFormat,
            Some(2) => CommandCode::SetUserBuffers,
            Some(3) => CommandCode::SetHeaderMode,
            Some(4) => CommandCode::SetCqSize,
            _ => return Err(Error::NotSupported),
        })
    }
}

/// A decoded configuration command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SetChirpsPerFrame(u32),
    SetDataFormat(DataFormat),
    SetUserBuffers(UserBufferConfig),
    SetHeaderMode(bool),
    SetCqSize([u16; MAX_CQ]),
}

impl Command {
    /// Decode `payload` for the command `code`.
    ///
    /// Unknown codes yield [`Error::NotSupported`]; a payload of the wrong
    /// length or an unknown data-format code yields [`Error::InvalidArgument`].
    pub fn decode(code: u32, payload: &[u8]) -> Result<Self, Error> {
        let code = CommandCode::try_from(code)?;
        if payload.len() != code.payload_len() {
            return Err(Error::InvalidArgument);
        }

        Ok(match code {
            CommandCode::SetChirpsPerFrame => Command::SetChirpsPerFrame(read_u32(payload, 0)),
            CommandCode::SetDataFormat => {
                Command::SetDataFormat(DataFormat::try_from(read_u32(payload, 0))?)
            }
            CommandCode::SetUserBuffers => Command::SetUserBuffers(UserBufferConfig {
                buffer1: user_buffer(read_u32(payload, 0), read_u32(payload, 4)),
                buffer2: user_buffer(read_u32(payload, 8), read_u32(payload, 12)),
            }),
            CommandCode::SetHeaderMode => Command::SetHeaderMode(payload[0] == 1),
            CommandCode::SetCqSize => {
                let mut sizes = [0u16; MAX_CQ];
                for (i, size) in sizes.iter_mut().enumerate() {
                    *size = u16::from_le_bytes([payload[2 * i], payload[2 * i + 1]]);
                }
                Command::SetCqSize(sizes)
            }
        })
    }
}

fn read_u32(payload: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([payload[at], payload[at + 1], payload[at + 2], payload[at + 3]])
}

/// A null address means the slot is not streamed.
fn user_buffer(address: u32, size: u32) -> Option<UserBuffer> {
    (address != 0).then_some(UserBuffer { address, size })
}
