//! Bus Pirate binary mode protocol constants and types
//!
//! Based on the "Binary SPI mode" documentation for firmware v5.10 and later.

use crate::error::{BusPirateError, Result};
use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

/// Banner returned once raw bitbang mode is active
pub const BBIO_BANNER: &[u8; 5] = b"BBIO1";
/// Banner returned once binary SPI mode is active
pub const SPI_BANNER: &[u8; 4] = b"SPI1";

/// Success response byte
pub const BP_ACK: u8 = 0x01;
/// Failure response byte
pub const BP_NAK: u8 = 0x00;

/// Number of 0x00 bytes to send before giving up on bitbang mode
pub const BBIO_ENTRY_ATTEMPTS: usize = 20;

/// Largest write or read length accepted by write-then-read
pub const MAX_WRITE_THEN_READ: usize = 4096;
/// Largest bulk transfer
pub const MAX_BULK: usize = 16;

// Bitbang mode commands
/// Reset to raw bitbang mode (answers `BBIO1`)
pub const BBIO_RESET: u8 = 0x00;
/// Enter binary SPI mode (answers `SPI1`)
pub const BBIO_ENTER_SPI: u8 = 0x01;
/// Leave binary mode and reset to the user terminal
pub const BBIO_RESET_TERMINAL: u8 = 0x0F;

// SPI mode commands
/// Drive chip select low
pub const SPI_CS_LOW: u8 = 0x02;
/// Drive chip select high
pub const SPI_CS_HIGH: u8 = 0x03;
/// Write then read, chip select framed by the firmware
pub const SPI_WRITE_THEN_READ: u8 = 0x04;
/// Bulk transfer of 1-16 bytes (low nibble is count - 1)
pub const SPI_BULK: u8 = 0x10;
/// Configure peripherals (low nibble is [`Peripherals`])
pub const SPI_PERIPHERALS: u8 = 0x40;
/// Set SPI speed (low three bits are [`SpiSpeed`])
pub const SPI_SPEED: u8 = 0x60;
/// Configure SPI (low nibble is [`SpiConfig`])
pub const SPI_CONFIG: u8 = 0x80;

bitflags! {
    /// Peripheral control bits (`0100wxyz`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Peripherals: u8 {
        /// Power supplies on
        const POWER   = 0x08;
        /// Pull-up resistors on
        const PULLUPS = 0x04;
        /// AUX pin high
        const AUX     = 0x02;
        /// Chip select high (idle)
        const CS      = 0x01;
    }
}

bitflags! {
    /// SPI configuration bits (`1000wxyz`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpiConfig: u8 {
        /// Push-pull 3.3V outputs (clear for open drain)
        const OUTPUT_3V3    = 0x08;
        /// Clock idles high
        const CLK_IDLE_HIGH = 0x04;
        /// Output changes on active-to-idle clock edge
        const CLK_EDGE      = 0x02;
        /// Sample input at end of data output time
        const SAMPLE_END    = 0x01;
    }
}

/// SPI clock rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SpiSpeed {
    /// 30 kHz
    Khz30,
    /// 125 kHz
    Khz125,
    /// 250 kHz
    Khz250,
    /// 1 MHz
    #[default]
    Mhz1,
    /// 2 MHz
    Mhz2,
    /// 2.6 MHz
    Mhz2_6,
    /// 4 MHz
    Mhz4,
    /// 8 MHz
    Mhz8,
}

impl SpiSpeed {
    /// All speeds in command order
    pub const ALL: [SpiSpeed; 8] = [
        Self::Khz30,
        Self::Khz125,
        Self::Khz250,
        Self::Mhz1,
        Self::Mhz2,
        Self::Mhz2_6,
        Self::Mhz4,
        Self::Mhz8,
    ];

    /// Command byte selecting this speed
    pub const fn command(&self) -> u8 {
        SPI_SPEED | *self as u8
    }

    /// Human readable name, as accepted by [`FromStr`]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Khz30 => "30kHz",
            Self::Khz125 => "125kHz",
            Self::Khz250 => "250kHz",
            Self::Mhz1 => "1MHz",
            Self::Mhz2 => "2MHz",
            Self::Mhz2_6 => "2.6MHz",
            Self::Mhz4 => "4MHz",
            Self::Mhz8 => "8MHz",
        }
    }
}

impl fmt::Display for SpiSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpiSpeed {
    type Err = BusPirateError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|speed| speed.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| {
                BusPirateError::InvalidParameter(format!(
                    "unknown SPI speed '{}' (expected one of: {})",
                    s,
                    Self::ALL.map(|speed| speed.name()).join(", ")
                ))
            })
    }
}

/// How a transaction is clocked through the firmware
///
/// Fixed when the device is opened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TransferMode {
    /// One write-then-read command per transaction; the firmware asserts
    /// and releases chip select
    #[default]
    WriteThenRead,
    /// Manual chip select around 16-byte bulk transfers, for firmware
    /// builds where write-then-read is missing or unreliable
    Bulk,
}

impl FromStr for TransferMode {
    type Err = BusPirateError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "wtr" | "write-then-read" => Ok(Self::WriteThenRead),
            "bulk" => Ok(Self::Bulk),
            _ => Err(BusPirateError::InvalidParameter(format!(
                "unknown transfer mode '{}' (expected wtr or bulk)",
                s
            ))),
        }
    }
}

/// Build a write-then-read command frame
///
/// Layout: `[0x04, wlen_hi, wlen_lo, rlen_hi, rlen_lo, data...]`
pub fn write_then_read_frame(write_data: &[u8], read_len: usize) -> Result<Vec<u8>> {
    let write_len = write_data.len();
    for len in [write_len, read_len] {
        if len > MAX_WRITE_THEN_READ {
            return Err(BusPirateError::TransferTooLong {
                len,
                max: MAX_WRITE_THEN_READ,
            });
        }
    }

    let mut frame = Vec::with_capacity(5 + write_len);
    frame.push(SPI_WRITE_THEN_READ);
    frame.extend_from_slice(&(write_len as u16).to_be_bytes());
    frame.extend_from_slice(&(read_len as u16).to_be_bytes());
    frame.extend_from_slice(write_data);
    Ok(frame)
}

/// Command byte for a bulk transfer of `len` (1-16) bytes
pub fn bulk_command(len: usize) -> u8 {
    debug_assert!((1..=MAX_BULK).contains(&len));
    SPI_BULK | (len - 1) as u8
}
