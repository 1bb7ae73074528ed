//! Error types for Bus Pirate operations

use thiserror::Error;

/// Bus Pirate specific errors
#[derive(Debug, Error)]
pub enum BusPirateError {
    /// Failed to connect to device
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Device never answered with the binary mode banner
    #[error("Failed to enter binary mode")]
    SyncFailed,

    /// Mode switch answered with an unexpected banner
    #[error("Unexpected mode banner: expected {expected:?}, got {got:?}")]
    UnexpectedBanner { expected: String, got: String },

    /// Command rejected by the firmware
    #[error("Command 0x{0:02X} rejected")]
    Nak(u8),

    /// Invalid response received
    #[error("Invalid response 0x{response:02X} for command 0x{command:02X}")]
    InvalidResponse { command: u8, response: u8 },

    /// Transaction larger than the firmware buffer
    #[error("Transfer of {len} bytes exceeds the {max} byte limit")]
    TransferTooLong { len: usize, max: usize },

    /// I/O error during communication
    #[error("I/O error: {0}")]
    IoError(String),

    /// Timeout during communication
    #[error("Communication timeout")]
    Timeout,

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),
}

/// Result type for Bus Pirate operations
pub type Result<T> = std::result::Result<T, BusPirateError>;

impl From<std::io::Error> for BusPirateError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            BusPirateError::Timeout
        } else {
            BusPirateError::IoError(e.to_string())
        }
    }
}
