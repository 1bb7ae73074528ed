//! SPI types and command structures
//!
//! This module provides the command header framing used on the wire and the
//! W25Q64FV opcodes.

mod address;
mod command;
pub mod opcodes;

pub use address::AddressWidth;
pub use command::CommandHeader;
pub use opcodes::*;
