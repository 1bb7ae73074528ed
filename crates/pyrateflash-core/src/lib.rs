//! pyrateflash-core - Command layer for Winbond W25Q64FV SPI NOR flash
//!
//! This crate turns flash operations (read, register reads, write enable,
//! page program, erase) into opcode + address transactions and hands them to
//! an [`SpiTransport`](transport::SpiTransport). Everything below the
//! write-then-read primitive (serial framing, pin setup, clock speed) lives
//! in the transport crates.
//!
//! It is `no_std` and only needs `alloc`.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`Error`]
//!
//! # Example
//!
//! ```ignore
//! use pyrateflash_core::w25q64fv::{W25q64fv, MAX_WORDS};
//!
//! let mut flash = W25q64fv::new(&mut transport);
//! let image = flash.read(0, MAX_WORDS)?;
//! let [sr1, sr2] = flash.status_registers()?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod spi;
pub mod status;
pub mod transport;
pub mod w25q64fv;

pub use error::{Error, Result};
pub use transport::SpiTransport;
pub use w25q64fv::W25q64fv;
