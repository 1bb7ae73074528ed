//! Transport traits and abstractions
//!
//! This module defines the capability every SPI bridge must provide for the
//! flash driver to talk to the chip.

mod traits;

pub use traits::*;
