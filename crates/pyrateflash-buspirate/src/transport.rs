//! Byte transport underneath the Bus Pirate protocol
//!
//! The Bus Pirate shows up as a USB CDC or FTDI serial port. Keeping the byte
//! stream behind a trait lets the protocol layer run against a scripted
//! transport in tests.

use crate::error::{BusPirateError, Result};

/// Byte stream to the firmware
pub trait Transport {
    /// Send all of `data`
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Fill `buf` completely
    ///
    /// Fails with [`BusPirateError::Timeout`] if the firmware stops
    /// answering first.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Take whatever arrives within `timeout_ms`, up to `buf.len()` bytes
    ///
    /// Returns 0 when nothing arrived. Used while the firmware is in an
    /// unknown state and may not answer at all.
    fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize>;

    /// Discard anything waiting in the receive buffer
    fn clear_input(&mut self) -> Result<()>;

    /// Push buffered output to the device
    fn flush(&mut self) -> Result<()>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }

    fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
        (**self).read_nonblock(buf, timeout_ms)
    }

    fn clear_input(&mut self) -> Result<()> {
        (**self).clear_input()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

pub mod serial {
    //! `serialport`-backed transport

    use super::*;
    use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
    use std::io::{ErrorKind, Read, Write};
    use std::time::Duration;

    /// Default baud rate of the Bus Pirate USB serial link
    pub const DEFAULT_BAUD: u32 = 115_200;
    /// Default read timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

    /// Bus Pirate serial link, 8N1 without flow control
    pub struct SerialTransport {
        port: Box<dyn SerialPort>,
        /// Timeout restored after each non-blocking read
        timeout: Duration,
    }

    impl SerialTransport {
        /// Open `device`, at 115200 baud unless `baud` says otherwise
        pub fn open(device: &str, baud: Option<u32>) -> Result<Self> {
            let baud = baud.unwrap_or(DEFAULT_BAUD);

            let port = serialport::new(device, baud)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(DEFAULT_TIMEOUT)
                .open()
                .map_err(|e| BusPirateError::ConnectionFailed(format!("{}: {}", device, e)))?;

            log::debug!("buspirate: Opened {} at {} baud", device, baud);

            Ok(Self {
                port,
                timeout: DEFAULT_TIMEOUT,
            })
        }
    }

    impl Transport for SerialTransport {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            Ok(self.port.write_all(data)?)
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<()> {
            Ok(self.port.read_exact(buf)?)
        }

        fn read_nonblock(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize> {
            self.port
                .set_timeout(Duration::from_millis(u64::from(timeout_ms)))?;
            let outcome = self.port.read(buf);
            self.port.set_timeout(self.timeout)?;

            match outcome {
                Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
                other => Ok(other?),
            }
        }

        fn clear_input(&mut self) -> Result<()> {
            Ok(self.port.clear(ClearBuffer::Input)?)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(self.port.flush()?)
        }
    }
}
