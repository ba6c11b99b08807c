//! Header subsystem contract.

use crate::config::LinkConfig;
use crate::error::DriverError;

use super::session::{SessionConfig, SessionKind};

/// Location and size of a header block in DMA-visible memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderBlock {
    pub address: u32,
    /// Size in link units.
    pub size: u32,
}

/// Contract for the header subsystem.
///
/// The subsystem owns one header slot per [`SessionKind`]. A header must be
/// deleted before a new one is created for the same kind.
pub trait HeaderBuilder {
    /// Prepare header generation for the link.
    fn init(&mut self, link: &LinkConfig) -> Result<(), DriverError>;

    /// Release the subsystem.
    fn deinit(&mut self) -> Result<(), DriverError>;

    /// Build the header describing `session` in the slot for its kind.
    fn create_header(&mut self, session: &SessionConfig) -> Result<(), DriverError>;

    /// Release the header held for `kind`.
    fn delete_header(&mut self, kind: SessionKind) -> Result<(), DriverError>;

    /// Address and size of the header held for `kind`.
    fn header_block(&self, kind: SessionKind) -> HeaderBlock;

    /// Convert a byte count into link units.
    fn to_link_units(&self, bytes: u32) -> u32;
}
