//! pyrateflash-dummy - In-memory W25Q64FV emulator
//!
//! This crate provides a transport that decodes each transaction as a
//! W25Q64FV would and serves it from memory. It's useful for testing and for
//! running the CLI without real hardware.

use pyrateflash_core::spi::opcodes;
use pyrateflash_core::status::StatusRegister1;
use pyrateflash_core::transport::{SpiTransport, MAX_TRANSACTION_LEN};
use pyrateflash_core::w25q64fv::{MAX_WORDS, PAGE_SIZE, SECTOR_SIZE, W25Q64FV_JEDEC_ID};
use thiserror::Error;

/// Errors raised by the emulator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DummyError {
    /// Transaction asked for more than the bridge can buffer
    #[error("Transfer of {0} bytes exceeds the {max} byte limit", max = MAX_TRANSACTION_LEN)]
    TransferTooLong(usize),

    /// Access past the end of the emulated flash
    #[error("Address 0x{addr:06X} + {len} bytes is out of bounds")]
    AddressOutOfBounds { addr: u32, len: usize },

    /// Program or erase without the write enable latch set
    #[error("Opcode 0x{0:02X} rejected: write enable latch not set")]
    WriteProtected(u8),

    /// Opcode the emulator does not implement
    #[error("Opcode 0x{0:02X} not supported")]
    OpcodeNotSupported(u8),

    /// Payload too short for the opcode
    #[error("Malformed command: {0}")]
    MalformedCommand(&'static str),
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, DummyError>;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u16,
    /// Flash size in bytes
    pub size: usize,
    /// Page size for programming
    pub page_size: usize,
    /// Sector size for smallest erase
    pub sector_size: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: W25Q64FV_JEDEC_ID.manufacturer,
            device_id: W25Q64FV_JEDEC_ID.device,
            size: MAX_WORDS as usize,
            page_size: PAGE_SIZE as usize,
            sector_size: SECTOR_SIZE as usize,
        }
    }
}

/// Dummy flash transport
///
/// Emulates a W25Q64FV behind a write-then-read bridge.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    status_reg1: u8,
    status_reg2: u8,
    write_enabled: bool,
    transactions: usize,
}

impl DummyFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            status_reg1: 0,
            status_reg2: 0,
            write_enabled: false,
            transactions: 0,
        }
    }

    /// Create a new dummy flash with default configuration (W25Q64FV)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of transactions served so far
    pub fn transactions(&self) -> usize {
        self.transactions
    }

    /// Preset the non-volatile status register bits
    pub fn set_status(&mut self, sr1: u8, sr2: u8) {
        self.status_reg1 = sr1;
        self.status_reg2 = sr2;
    }

    fn status1(&self) -> u8 {
        let mut sr1 = StatusRegister1::from_bits_retain(self.status_reg1);
        sr1.remove(StatusRegister1::BUSY);
        sr1.set(StatusRegister1::WEL, self.write_enabled);
        sr1.bits()
    }

    fn check_bounds(&self, addr: u32, len: usize) -> Result<usize> {
        let start = addr as usize;
        if start + len > self.data.len() {
            return Err(DummyError::AddressOutOfBounds { addr, len });
        }
        Ok(start)
    }

    fn require_wel(&mut self, opcode: u8) -> Result<()> {
        if !self.write_enabled {
            return Err(DummyError::WriteProtected(opcode));
        }
        self.write_enabled = false;
        Ok(())
    }

    fn handle_read(&mut self, addr: u32, read_len: usize) -> Result<Vec<u8>> {
        let start = self.check_bounds(addr, read_len)?;
        Ok(self.data[start..start + read_len].to_vec())
    }

    fn handle_page_program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_bounds(addr, 1)?;
        self.require_wel(opcodes::PP)?;

        // Past the end of the page the address wraps to the page start,
        // and programming can only change 1 -> 0
        let page_size = self.config.page_size;
        let page_base = addr as usize & !(page_size - 1);
        let offset = addr as usize - page_base;
        for (i, &byte) in data.iter().enumerate() {
            self.data[page_base + (offset + i) % page_size] &= byte;
        }
        Ok(())
    }

    fn handle_erase(&mut self, opcode: u8, addr: u32, erase_size: usize) -> Result<()> {
        let aligned_addr = addr & !(erase_size as u32 - 1);
        let start = self.check_bounds(aligned_addr, erase_size)?;
        self.require_wel(opcode)?;
        self.data[start..start + erase_size].fill(0xFF);
        Ok(())
    }

    fn handle_chip_erase(&mut self, opcode: u8) -> Result<()> {
        self.require_wel(opcode)?;
        self.data.fill(0xFF);
        Ok(())
    }
}

impl SpiTransport for DummyFlash {
    type Error = DummyError;

    fn write_then_read(
        &mut self,
        write_len: usize,
        read_len: usize,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        if write_len > MAX_TRANSACTION_LEN || read_len > MAX_TRANSACTION_LEN {
            return Err(DummyError::TransferTooLong(write_len.max(read_len)));
        }
        let payload = payload
            .get(..write_len)
            .ok_or(DummyError::MalformedCommand("payload shorter than write length"))?;
        let (&opcode, rest) = payload
            .split_first()
            .ok_or(DummyError::MalformedCommand("missing opcode"))?;

        self.transactions += 1;

        let (addr, data) = if opcodes::takes_address(opcode) {
            if rest.len() < 3 {
                return Err(DummyError::MalformedCommand("missing address"));
            }
            let addr = u32::from_be_bytes([0, rest[0], rest[1], rest[2]]);
            (addr, &rest[3..])
        } else {
            (0, rest)
        };

        log::trace!(
            "dummy: opcode 0x{:02X} addr 0x{:06X} data {} read {}",
            opcode,
            addr,
            data.len(),
            read_len
        );

        match opcode {
            opcodes::RDID => {
                let [hi, lo] = self.config.device_id.to_be_bytes();
                let id = [self.config.manufacturer_id, hi, lo];
                Ok(id.iter().copied().cycle().take(read_len).collect())
            }

            // Status registers repeat for as long as the clock runs
            opcodes::RDSR => Ok(vec![self.status1(); read_len]),
            opcodes::RDSR2 => Ok(vec![self.status_reg2; read_len]),

            opcodes::WREN => {
                self.write_enabled = true;
                Ok(Vec::new())
            }
            opcodes::WRDI => {
                self.write_enabled = false;
                Ok(Vec::new())
            }

            opcodes::READ => self.handle_read(addr, read_len),

            opcodes::PP => {
                self.handle_page_program(addr, data)?;
                Ok(vec![0xFF; read_len])
            }

            opcodes::SE_20 => {
                self.handle_erase(opcode, addr, self.config.sector_size)?;
                Ok(vec![0xFF; read_len])
            }
            opcodes::BE_52 => {
                self.handle_erase(opcode, addr, 32 * 1024)?;
                Ok(vec![0xFF; read_len])
            }
            opcodes::BE_D8 => {
                self.handle_erase(opcode, addr, 64 * 1024)?;
                Ok(vec![0xFF; read_len])
            }
            opcodes::CE_60 | opcodes::CE_C7 => {
                self.handle_chip_erase(opcode)?;
                Ok(vec![0xFF; read_len])
            }

            _ => Err(DummyError::OpcodeNotSupported(opcode)),
        }
    }

    fn delay_us(&mut self, _us: u32) {
        // No delay needed for in-memory operations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrateflash_core::status::StatusRegisters;
    use pyrateflash_core::w25q64fv::{W25q64fv, CHUNK_LIMIT};
    use pyrateflash_core::Error;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + 3) as u8).collect()
    }

    #[test]
    fn test_read_jedec_id() {
        let mut flash = DummyFlash::new_default();
        let id = W25q64fv::new(&mut flash).read_jedec_id().unwrap();
        assert_eq!(id, W25Q64FV_JEDEC_ID);
    }

    #[test]
    fn test_large_read_stays_within_transaction_limit() {
        let image = pattern(MAX_WORDS as usize);
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &image);

        let data = W25q64fv::new(&mut flash).read(0x1234, 3 * CHUNK_LIMIT + 17).unwrap();
        assert_eq!(data, image[0x1234..0x1234 + 3 * 4096 + 17]);
        assert_eq!(flash.transactions(), 4);
    }

    #[test]
    fn test_oversized_transaction_rejected() {
        let mut flash = DummyFlash::new_default();
        let err = flash
            .write_then_read(4, 4097, &[opcodes::READ, 0, 0, 0])
            .unwrap_err();
        assert_eq!(err, DummyError::TransferTooLong(4097));
    }

    #[test]
    fn test_store_then_read_back() {
        let mut flash = DummyFlash::new_default();
        let data = pattern(1000);

        let mut driver = W25q64fv::new(&mut flash);
        driver.store(0x3F80, &data, false).unwrap();
        let back = driver.read(0x3F80, data.len() as u32).unwrap();
        assert_eq!(back, data);

        // Neighbouring bytes untouched
        assert_eq!(flash.data()[0x3F7F], 0xFF);
        assert_eq!(flash.data()[0x3F80 + 1000], 0xFF);
    }

    #[test]
    fn test_store_with_chip_erase() {
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &[0x00; 8192]);

        W25q64fv::new(&mut flash)
            .store(0x100, &[0xA5; 16], true)
            .unwrap();

        assert!(flash.data()[..0x100].iter().all(|&b| b == 0xFF));
        assert!(flash.data()[0x100..0x110].iter().all(|&b| b == 0xA5));
        assert!(flash.data()[0x110..8192].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_program_without_erase_only_clears_bits() {
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &[0x0F; 4]);

        W25q64fv::new(&mut flash).store(0, &[0xF0; 4], false).unwrap();
        assert_eq!(flash.data()[..4], [0x00; 4]);
    }

    #[test]
    fn test_erase_sector() {
        let mut flash = DummyFlash::with_data(DummyConfig::default(), &[0x00; 3 * 4096]);

        W25q64fv::new(&mut flash).erase_sector(0x1000).unwrap();

        assert!(flash.data()[..0x1000].iter().all(|&b| b == 0x00));
        assert!(flash.data()[0x1000..0x2000].iter().all(|&b| b == 0xFF));
        assert!(flash.data()[0x2000..0x3000].iter().all(|&b| b == 0x00));
    }

    #[test]
    fn test_page_program_requires_write_enable() {
        let mut flash = DummyFlash::new_default();
        let err = flash
            .write_then_read(5, 0, &[opcodes::PP, 0, 0, 0, 0x00])
            .unwrap_err();
        assert_eq!(err, DummyError::WriteProtected(opcodes::PP));
        assert_eq!(flash.data()[0], 0xFF);
    }

    #[test]
    fn test_page_program_wraps_within_page() {
        let mut flash = DummyFlash::new_default();
        flash.write_then_read(1, 0, &[opcodes::WREN]).unwrap();
        flash
            .write_then_read(6, 0, &[opcodes::PP, 0x00, 0x01, 0xFF, 0x11, 0x22])
            .unwrap();
        assert_eq!(flash.data()[0x1FF], 0x11);
        assert_eq!(flash.data()[0x100], 0x22);
        assert_eq!(flash.data()[0x200], 0xFF);
    }

    #[test]
    fn test_status_registers_track_wel() {
        let mut flash = DummyFlash::new_default();
        flash.set_status(0x1C, 0x02);

        let mut driver = W25q64fv::new(&mut flash);
        assert_eq!(driver.status_registers().unwrap(), [0x1C, 0x02]);

        driver.write_enable().unwrap();
        let regs = StatusRegisters::from_bytes(driver.status_registers().unwrap());
        assert!(regs.sr1.write_enabled());
        assert_eq!(regs.sr1.block_protect(), 0b111);

        driver.write_disable().unwrap();
        assert!(!driver.read_status1().unwrap().write_enabled());
    }

    #[test]
    fn test_transport_error_passes_through() {
        let config = DummyConfig {
            size: 4096,
            ..Default::default()
        };
        let mut flash = DummyFlash::new(config);
        let err = W25q64fv::new(&mut flash).read(0, 8192).unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(DummyError::AddressOutOfBounds { addr: 0x1000, .. })
        ));
    }

    #[test]
    fn test_unknown_opcode() {
        let mut flash = DummyFlash::new_default();
        let err = flash.write_then_read(1, 0, &[0xAB]).unwrap_err();
        assert_eq!(err, DummyError::OpcodeNotSupported(0xAB));
    }
}
