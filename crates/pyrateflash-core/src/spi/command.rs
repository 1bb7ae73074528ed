//! SPI command header

use super::AddressWidth;
use alloc::vec::Vec;

/// Opcode plus optional address, as clocked out at the start of a
/// transaction
///
/// A fresh header is built for every transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandHeader {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,
}

impl CommandHeader {
    /// Create a header with no address (e.g., WREN, RDSR)
    pub const fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
        }
    }

    /// Create a header with a 3-byte address (e.g., READ, PP)
    pub const fn with_address(opcode: u8, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            address_width: AddressWidth::ThreeByte,
        }
    }

    /// Number of bytes the header occupies on the wire
    pub const fn header_len(&self) -> usize {
        1 + self.address_width.bytes() as usize
    }

    /// Encode opcode and address into `buf`, returning the bytes written
    ///
    /// `buf` must be at least [`header_len`](Self::header_len) bytes.
    pub fn encode(&self, buf: &mut [u8]) -> usize {
        buf[0] = self.opcode;
        if let Some(addr) = self.address {
            self.address_width.encode(addr, &mut buf[1..]);
        }
        self.header_len()
    }

    /// Build a complete write payload: header followed by `data`
    pub fn to_payload(&self, data: &[u8]) -> Vec<u8> {
        let header_len = self.header_len();
        let mut payload = alloc::vec![0u8; header_len + data.len()];
        self.encode(&mut payload);
        payload[header_len..].copy_from_slice(data);
        payload
    }
}
