//! Programmer selection for the pyrateflash CLI
//!
//! This crate owns the mapping from programmer strings to transports. The
//! CLI opens a [`ProgrammerHandle`] by name and drives the flash through it,
//! without naming the transport crates itself.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CLI (bin/pyrateflash)                   │
//! │  - Opens programmers by string, drives W25q64fv              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  pyrateflash-flash (this crate)              │
//! │  - open_programmer: parses "name:key=value,..."              │
//! │  - ProgrammerHandle: enum over compiled-in transports        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┴───────────────┐
//!              ▼                               ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │    pyrateflash-core      │   │  Transport crates        │
//! │  - W25q64fv driver       │   │  - buspirate, dummy      │
//! │  - SpiTransport trait    │   │  - Implement SpiTransport│
//! └──────────────────────────┘   └──────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use pyrateflash_flash::open_programmer;
//!
//! let mut handle = open_programmer("buspirate:dev=/dev/ttyUSB0")?;
//! let mut flash = handle.flash();
//! let image = flash.read(0, pyrateflash_core::w25q64fv::MAX_WORDS)?;
//! ```

mod handle;
mod registry;

pub use handle::{ProgrammerError, ProgrammerHandle};
pub use registry::{
    available_programmers, open_programmer, parse_programmer_params, programmer_names_short,
    ProgrammerParams,
};

// Re-export core types that CLI needs
pub use pyrateflash_core::transport::TransportInfo;
pub use pyrateflash_core::W25q64fv;
