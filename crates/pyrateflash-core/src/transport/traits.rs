//! Transport trait definitions

use alloc::vec::Vec;
use core::fmt;

/// Largest number of bytes a single transaction may read back
///
/// USB SPI bridges buffer a whole transaction before answering; 4096 bytes is
/// the limit of the Bus Pirate write-then-read command and the driver tiles
/// larger reads into chunks of this size.
pub const MAX_TRANSACTION_LEN: usize = 4096;

/// SPI transport capability
///
/// A transport owns the physical link (serial port, pin state, clock speed,
/// chip-select framing). The flash driver only needs one primitive from it:
/// assert chip-select, clock out `payload`, clock in `read_len` bytes, then
/// release chip-select.
///
/// ## Example
///
/// ```ignore
/// impl SpiTransport for MyBridge {
///     type Error = MyError;
///
///     fn write_then_read(
///         &mut self,
///         write_len: usize,
///         read_len: usize,
///         payload: &[u8],
///     ) -> Result<Vec<u8>, MyError> {
///         self.send_frame(&payload[..write_len])?;
///         self.receive(read_len)
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         std::thread::sleep(std::time::Duration::from_micros(us as u64));
///     }
/// }
/// ```
pub trait SpiTransport {
    /// Error produced by the link
    type Error: fmt::Debug + fmt::Display;

    /// Perform one chip-select framed transaction
    ///
    /// Sends the first `write_len` bytes of `payload`, then reads back
    /// `read_len` bytes. Implementations return exactly `read_len` bytes on
    /// success. Callers never pass a `read_len` above
    /// [`MAX_TRANSACTION_LEN`].
    fn write_then_read(
        &mut self,
        write_len: usize,
        read_len: usize,
        payload: &[u8],
    ) -> Result<Vec<u8>, Self::Error>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<T: SpiTransport + ?Sized> SpiTransport for &mut T {
    type Error = T::Error;

    fn write_then_read(
        &mut self,
        write_len: usize,
        read_len: usize,
        payload: &[u8],
    ) -> Result<Vec<u8>, Self::Error> {
        (**self).write_then_read(write_len, read_len, payload)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}

/// Information about a transport implementation
#[derive(Debug, Clone)]
pub struct TransportInfo {
    /// Name of the transport
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
}
