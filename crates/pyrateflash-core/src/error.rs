//! Error types for pyrateflash-core
//!
//! The error is generic over the transport's own error type so that link
//! failures reach the caller unchanged.

use core::fmt;

/// Core error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    // Address/size errors
    /// Request reaches past the end of the flash
    OutOfRange {
        /// Start address of the request
        addr: u32,
        /// Length of the request in bytes
        len: u32,
    },
    /// Page program data would wrap inside the page
    CrossesPageBoundary {
        /// Start address of the program
        addr: u32,
        /// Number of bytes to program
        len: usize,
    },
    /// Address is not aligned to the erase unit
    Misaligned {
        /// Offending address
        addr: u32,
        /// Required alignment in bytes
        alignment: u32,
    },
    /// Page program called without data
    EmptyWrite,

    // Device errors
    /// Transport returned a different number of bytes than requested
    ShortResponse {
        /// Bytes requested
        expected: usize,
        /// Bytes received
        actual: usize,
    },
    /// Busy bit did not clear in time
    Timeout,

    /// Error from the underlying SPI transport
    Transport(E),
}

impl<E> From<E> for Error<E> {
    fn from(e: E) -> Self {
        Self::Transport(e)
    }
}

impl<E: fmt::Display> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { addr, len } => write!(
                f,
                "out of range for flash memory size: 0x{:06X} + {} bytes",
                addr, len
            ),
            Self::CrossesPageBoundary { addr, len } => write!(
                f,
                "page program of {} bytes at 0x{:06X} crosses a page boundary",
                len, addr
            ),
            Self::Misaligned { addr, alignment } => write!(
                f,
                "address 0x{:06X} is not aligned to {} bytes",
                addr, alignment
            ),
            Self::EmptyWrite => write!(f, "nothing to program"),
            Self::ShortResponse { expected, actual } => write!(
                f,
                "transport returned {} bytes, expected {}",
                actual, expected
            ),
            Self::Timeout => write!(f, "flash busy timeout"),
            Self::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for Error<E> {}

/// Result type alias using the core Error type
pub type Result<T, E> = core::result::Result<T, Error<E>>;
