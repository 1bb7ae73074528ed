//! Status register bit definitions
//!
//! Layouts follow the W25Q64FV datasheet (section 7.1).

use bitflags::bitflags;

bitflags! {
    /// Status Register 1 (read with `RDSR`, 0x05)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister1: u8 {
        /// Erase/program in progress
        const BUSY = 1 << 0;
        /// Write Enable Latch
        const WEL  = 1 << 1;
        /// Block Protect bit 0
        const BP0  = 1 << 2;
        /// Block Protect bit 1
        const BP1  = 1 << 3;
        /// Block Protect bit 2
        const BP2  = 1 << 4;
        /// Top/Bottom Protect
        const TB   = 1 << 5;
        /// Sector/Block Protect
        const SEC  = 1 << 6;
        /// Status Register Protect 0
        const SRP0 = 1 << 7;

        /// All block protect bits
        const BP = Self::BP0.bits() | Self::BP1.bits() | Self::BP2.bits();
    }
}

bitflags! {
    /// Status Register 2 (read with `RDSR2`, 0x35)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister2: u8 {
        /// Status Register Protect 1
        const SRP1 = 1 << 0;
        /// Quad Enable
        const QE   = 1 << 1;
        /// Security Register Lock bit 1
        const LB1  = 1 << 3;
        /// Security Register Lock bit 2
        const LB2  = 1 << 4;
        /// Security Register Lock bit 3
        const LB3  = 1 << 5;
        /// Complement Protect
        const CMP  = 1 << 6;
        /// Erase/program suspended
        const SUS  = 1 << 7;
    }
}

impl StatusRegister1 {
    /// Returns true while a program or erase is running
    pub fn is_busy(&self) -> bool {
        self.contains(Self::BUSY)
    }

    /// Returns true if the write enable latch is set
    pub fn write_enabled(&self) -> bool {
        self.contains(Self::WEL)
    }

    /// Block protect field (BP2:BP0) as a number
    pub fn block_protect(&self) -> u8 {
        (self.bits() & Self::BP.bits()) >> 2
    }
}

/// Both status registers, decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRegisters {
    /// Status Register 1
    pub sr1: StatusRegister1,
    /// Status Register 2
    pub sr2: StatusRegister2,
}

impl StatusRegisters {
    /// Decode the `[reg1, reg2]` pair returned by
    /// [`W25q64fv::status_registers`](crate::w25q64fv::W25q64fv::status_registers)
    pub fn from_bytes(raw: [u8; 2]) -> Self {
        Self {
            sr1: StatusRegister1::from_bits_retain(raw[0]),
            sr2: StatusRegister2::from_bits_retain(raw[1]),
        }
    }
}
