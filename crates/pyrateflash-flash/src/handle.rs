//! ProgrammerHandle - runtime choice of transport
//!
//! Programmers are selected by name on the command line, so the concrete
//! transport type is only known at runtime. The handle is a plain enum over
//! the compiled-in transports and forwards to whichever one it holds.

use pyrateflash_core::transport::SpiTransport;
use pyrateflash_core::W25q64fv;
use thiserror::Error;

#[cfg(feature = "buspirate")]
use pyrateflash_buspirate::{BusPirate, BusPirateError, SerialTransport};
#[cfg(feature = "dummy")]
use pyrateflash_dummy::{DummyError, DummyFlash};

/// Error from whichever transport a [`ProgrammerHandle`] holds
#[derive(Debug, Error)]
pub enum ProgrammerError {
    /// In-memory emulator error
    #[cfg(feature = "dummy")]
    #[error(transparent)]
    Dummy(#[from] DummyError),

    /// Bus Pirate error
    #[cfg(feature = "buspirate")]
    #[error(transparent)]
    BusPirate(#[from] BusPirateError),
}

/// An opened programmer
///
/// The handle owns the transport; dropping it releases the hardware.
pub enum ProgrammerHandle {
    /// In-memory W25Q64FV emulator
    #[cfg(feature = "dummy")]
    Dummy(DummyFlash),

    /// Bus Pirate on a serial port
    #[cfg(feature = "buspirate")]
    BusPirate(BusPirate<SerialTransport>),
}

impl ProgrammerHandle {
    /// Canonical programmer name
    pub fn name(&self) -> &'static str {
        // Deref so the match stays exhaustive with no programmer compiled in
        match *self {
            #[cfg(feature = "dummy")]
            Self::Dummy(_) => "dummy",
            #[cfg(feature = "buspirate")]
            Self::BusPirate(_) => "buspirate",
        }
    }

    /// Driver for the W25Q64FV behind this programmer
    pub fn flash(&mut self) -> W25q64fv<'_, Self> {
        W25q64fv::new(self)
    }
}

impl SpiTransport for ProgrammerHandle {
    type Error = ProgrammerError;

    fn write_then_read(
        &mut self,
        write_len: usize,
        read_len: usize,
        payload: &[u8],
    ) -> Result<Vec<u8>, ProgrammerError> {
        match *self {
            #[cfg(feature = "dummy")]
            Self::Dummy(ref mut dummy) => {
                Ok(dummy.write_then_read(write_len, read_len, payload)?)
            }
            #[cfg(feature = "buspirate")]
            Self::BusPirate(ref mut bp) => Ok(bp.write_then_read(write_len, read_len, payload)?),
        }
    }

    fn delay_us(&mut self, us: u32) {
        match *self {
            #[cfg(feature = "dummy")]
            Self::Dummy(ref mut dummy) => dummy.delay_us(us),
            #[cfg(feature = "buspirate")]
            Self::BusPirate(ref mut bp) => bp.delay_us(us),
        }
    }
}

#[cfg(feature = "dummy")]
impl From<DummyFlash> for ProgrammerHandle {
    fn from(dummy: DummyFlash) -> Self {
        Self::Dummy(dummy)
    }
}

#[cfg(feature = "buspirate")]
impl From<BusPirate<SerialTransport>> for ProgrammerHandle {
    fn from(bp: BusPirate<SerialTransport>) -> Self {
        Self::BusPirate(bp)
    }
}
