//! pyrateflash-buspirate - Bus Pirate SPI transport
//!
//! This crate drives a Bus Pirate (firmware v5.10 or later) in binary SPI
//! mode and exposes it as an [`SpiTransport`](pyrateflash_core::SpiTransport).
//!
//! # Protocol Overview
//!
//! The firmware boots into a text terminal. Sending `0x00` repeatedly drops
//! it into raw bitbang mode (`BBIO1`), and `0x01` then selects binary SPI
//! mode (`SPI1`). From there every command is a single byte, answered with
//! `0x01` on success.
//!
//! Transactions go out either as one write-then-read command (`0x04`, the
//! firmware frames chip select) or, for firmware where that command is
//! broken, as manual chip select around 16-byte bulk transfers. See
//! [`TransferMode`].
//!
//! # Example
//!
//! ```no_run
//! use pyrateflash_buspirate::{open_buspirate, BusPirateOptions};
//! use pyrateflash_core::W25q64fv;
//!
//! let options = BusPirateOptions::new("/dev/ttyUSB0");
//! let mut bp = open_buspirate(&options)?;
//!
//! let mut flash = W25q64fv::new(&mut bp);
//! let [sr1, sr2] = flash.status_registers()?;
//! println!("SR1={:02X} SR2={:02X}", sr1, sr2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports
pub use device::BusPirate;
pub use error::{BusPirateError, Result};
pub use protocol::{Peripherals, SpiConfig, SpiSpeed, TransferMode};
pub use transport::serial::SerialTransport;
pub use transport::Transport;

/// Connection options for a Bus Pirate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusPirateOptions {
    /// Serial device path (e.g., "/dev/ttyUSB0" or "COM3")
    pub device: String,
    /// Baud rate (None for 115200)
    pub baud: Option<u32>,
    /// SPI clock rate
    pub speed: SpiSpeed,
    /// Transaction strategy
    pub mode: TransferMode,
    /// Enable the on-board pull-up resistors
    pub pullups: bool,
}

impl BusPirateOptions {
    /// Options for `device` with default speed, mode and pull-ups off
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            baud: None,
            speed: SpiSpeed::default(),
            mode: TransferMode::default(),
            pullups: false,
        }
    }

    /// Build options from `key=value` programmer parameters
    ///
    /// Recognized keys:
    /// - `dev=/dev/ttyUSB0[:baud]` (required)
    /// - `speed=30kHz|125kHz|250kHz|1MHz|2MHz|2.6MHz|4MHz|8MHz`
    /// - `mode=wtr|bulk`
    /// - `pullups=on|off`
    pub fn from_params<'a, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut device = None;
        let mut options = Self::new(String::new());

        for (key, value) in params {
            match key {
                "dev" => {
                    let (path, baud) = parse_device(value)?;
                    device = Some(path);
                    options.baud = baud;
                }
                "speed" | "spispeed" => options.speed = value.parse()?,
                "mode" => options.mode = value.parse()?,
                "pullups" => options.pullups = parse_switch(key, value)?,
                _ => {
                    return Err(BusPirateError::InvalidParameter(format!(
                        "unknown option '{}'",
                        key
                    )))
                }
            }
        }

        options.device = device.ok_or_else(|| {
            BusPirateError::InvalidParameter(
                "missing dev= (usage: buspirate:dev=/dev/ttyUSB0[:baud])".into(),
            )
        })?;
        Ok(options)
    }

    /// Pin state applied after entering SPI mode
    pub fn peripherals(&self) -> Peripherals {
        let mut pins = Peripherals::POWER | Peripherals::CS;
        if self.pullups {
            pins |= Peripherals::PULLUPS;
        }
        pins
    }
}

/// SPI configuration for 25-series flash: 3.3V push-pull outputs, idle-low
/// clock, output on the active-to-idle edge (mode 0)
pub const FLASH_SPI_CONFIG: SpiConfig = SpiConfig::OUTPUT_3V3.union(SpiConfig::CLK_EDGE);

/// Open a Bus Pirate on a serial port and prepare it for flash access
///
/// Enters binary SPI mode, powers the target, configures the bus for SPI
/// mode 0 and sets the clock rate.
pub fn open_buspirate(options: &BusPirateOptions) -> Result<BusPirate<SerialTransport>> {
    let transport = SerialTransport::open(&options.device, options.baud)?;
    let mut bp = BusPirate::new(transport, options.mode)?;

    bp.set_peripherals(options.peripherals())?;
    bp.configure(FLASH_SPI_CONFIG)?;
    bp.set_speed(options.speed)?;

    log::info!(
        "buspirate: Ready on {} at {} ({:?} transfers)",
        options.device,
        options.speed,
        options.mode
    );
    Ok(bp)
}

/// Split `path[:baud]`
fn parse_device(value: &str) -> Result<(String, Option<u32>)> {
    match value.rsplit_once(':') {
        Some((path, baud_str)) => {
            let baud = baud_str.parse().map_err(|_| {
                BusPirateError::InvalidParameter(format!("invalid baud rate: {}", baud_str))
            })?;
            Ok((path.to_string(), Some(baud)))
        }
        None => Ok((value.to_string(), None)),
    }
}

fn parse_switch(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "yes" | "1" | "true" => Ok(true),
        "off" | "no" | "0" | "false" => Ok(false),
        _ => Err(BusPirateError::InvalidParameter(format!(
            "{}={} (expected on or off)",
            key, value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = BusPirateOptions::from_params([("dev", "/dev/ttyUSB0")]).unwrap();
        assert_eq!(options, BusPirateOptions::new("/dev/ttyUSB0"));
        assert_eq!(options.peripherals(), Peripherals::POWER | Peripherals::CS);
    }

    #[test]
    fn test_options_full() {
        let options = BusPirateOptions::from_params([
            ("dev", "/dev/ttyACM0:921600"),
            ("speed", "8MHz"),
            ("mode", "bulk"),
            ("pullups", "on"),
        ])
        .unwrap();

        assert_eq!(options.device, "/dev/ttyACM0");
        assert_eq!(options.baud, Some(921_600));
        assert_eq!(options.speed, SpiSpeed::Mhz8);
        assert_eq!(options.mode, TransferMode::Bulk);
        assert!(options.peripherals().contains(Peripherals::PULLUPS));
    }

    #[test]
    fn test_options_errors() {
        assert!(BusPirateOptions::from_params([("speed", "1MHz")]).is_err());
        assert!(BusPirateOptions::from_params([("dev", "/dev/ttyUSB0:fast")]).is_err());
        assert!(BusPirateOptions::from_params([("dev", "COM3"), ("cs", "1")]).is_err());
        assert!(BusPirateOptions::from_params([("dev", "COM3"), ("pullups", "maybe")]).is_err());
    }

    #[test]
    fn test_flash_spi_config() {
        assert_eq!(FLASH_SPI_CONFIG.bits(), 0x0A);
    }
}
