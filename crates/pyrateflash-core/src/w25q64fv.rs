//! Winbond W25Q64FV command layer
//!
//! The driver borrows an [`SpiTransport`] and turns flash operations into
//! single-I/O transactions: an opcode, an optional 24-bit big-endian address,
//! optional data, and a read phase.
//!
//! Reads larger than [`CHUNK_LIMIT`] are tiled into consecutive transactions
//! because the bridge cannot buffer more than that in one go. Writing uses
//! Page Program, with a write-enable and a busy poll per page.

use crate::error::{Error, Result};
use crate::spi::{opcodes, CommandHeader};
use crate::status::{StatusRegister1, StatusRegister2};
use crate::transport::{SpiTransport, MAX_TRANSACTION_LEN};
use alloc::vec::Vec;

/// Page size in bytes
pub const PAGE_SIZE: u32 = 256;
/// Total size of the flash in bytes (64 Mbit)
pub const MAX_WORDS: u32 = PAGE_SIZE * 32768;
/// Largest read issued as one transaction
pub const CHUNK_LIMIT: u32 = MAX_TRANSACTION_LEN as u32;
/// Smallest erase unit in bytes
pub const SECTOR_SIZE: u32 = 4096;

/// JEDEC ID reported by a W25Q64FV
pub const W25Q64FV_JEDEC_ID: JedecId = JedecId {
    manufacturer: 0xEF,
    device: 0x4017,
};

/// JEDEC manufacturer and device ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JedecId {
    /// Manufacturer ID (0xEF for Winbond)
    pub manufacturer: u8,
    /// Memory type and capacity
    pub device: u16,
}

/// Busy polling parameters for one kind of operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    /// Delay between status register reads
    pub delay_us: u32,
    /// Give up after this long
    pub timeout_us: u32,
}

impl Poll {
    /// Create polling parameters
    pub const fn new(delay_us: u32, timeout_us: u32) -> Self {
        Self {
            delay_us,
            timeout_us,
        }
    }

    fn max_polls(&self) -> u32 {
        let polls = if self.delay_us > 0 {
            self.timeout_us / self.delay_us
        } else {
            self.timeout_us
        };
        polls.max(1)
    }
}

/// Busy polling parameters per operation
///
/// Defaults are taken from the datasheet's maximum times (tPP 3 ms,
/// tSE 400 ms, tCE 100 s) with margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Page program: poll every 10us, timeout after 10ms
    pub page_program: Poll,
    /// 4KB sector erase: poll every 10ms, timeout after 1s
    pub sector_erase: Poll,
    /// Chip erase: poll every 1s, timeout after 200s
    pub chip_erase: Poll,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            page_program: Poll::new(10, 10_000),
            sector_erase: Poll::new(10_000, 1_000_000),
            chip_erase: Poll::new(1_000_000, 200_000_000),
        }
    }
}

/// W25Q64FV flash driver
///
/// Holds a mutable borrow of a connected transport for its whole lifetime,
/// so calls are serialized by construction.
pub struct W25q64fv<'a, T: SpiTransport + ?Sized> {
    transport: &'a mut T,
    poll: PollConfig,
}

impl<'a, T: SpiTransport + ?Sized> W25q64fv<'a, T> {
    /// Create a driver on top of an already configured transport
    pub fn new(transport: &'a mut T) -> Self {
        Self {
            transport,
            poll: PollConfig::default(),
        }
    }

    /// Replace the busy polling parameters
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Read `amount` bytes starting at `addr`
    ///
    /// The request is split into [`CHUNK_LIMIT`]-sized transactions; the
    /// result is the concatenation in address order. A failure in any chunk
    /// aborts the whole read.
    pub fn read(&mut self, addr: u32, amount: u32) -> Result<Vec<u8>, T::Error> {
        check_range(addr, amount as usize)?;

        let mut res = Vec::with_capacity(amount as usize);
        let mut addr = addr;
        let mut remaining = amount;

        while remaining > CHUNK_LIMIT {
            let header = CommandHeader::with_address(opcodes::READ, addr);
            let chunk = self.transact(&header, &[], CHUNK_LIMIT as usize)?;
            res.extend_from_slice(&chunk);
            remaining -= CHUNK_LIMIT;
            addr += CHUNK_LIMIT;
        }

        let header = CommandHeader::with_address(opcodes::READ, addr);
        let chunk = self.transact(&header, &[], remaining as usize)?;
        res.extend_from_slice(&chunk);

        Ok(res)
    }

    /// Read both status registers, returned as `[reg1, reg2]`
    pub fn status_registers(&mut self) -> Result<[u8; 2], T::Error> {
        let sr1 = self.read_register(opcodes::RDSR)?;
        let sr2 = self.read_register(opcodes::RDSR2)?;
        Ok([sr1, sr2])
    }

    /// Read status register 1
    pub fn read_status1(&mut self) -> Result<StatusRegister1, T::Error> {
        self.read_register(opcodes::RDSR)
            .map(StatusRegister1::from_bits_retain)
    }

    /// Read status register 2
    pub fn read_status2(&mut self) -> Result<StatusRegister2, T::Error> {
        self.read_register(opcodes::RDSR2)
            .map(StatusRegister2::from_bits_retain)
    }

    /// Set the Write Enable Latch
    ///
    /// Must precede every raw page program or erase command. The
    /// higher-level helpers in this driver issue it themselves.
    pub fn write_enable(&mut self) -> Result<(), T::Error> {
        self.transact(&CommandHeader::simple(opcodes::WREN), &[], 0)?;
        Ok(())
    }

    /// Clear the Write Enable Latch
    pub fn write_disable(&mut self) -> Result<(), T::Error> {
        self.transact(&CommandHeader::simple(opcodes::WRDI), &[], 0)?;
        Ok(())
    }

    /// Read the JEDEC manufacturer and device ID
    pub fn read_jedec_id(&mut self) -> Result<JedecId, T::Error> {
        let buf = self.transact(&CommandHeader::simple(opcodes::RDID), &[], 3)?;
        Ok(JedecId {
            manufacturer: buf[0],
            device: u16::from_be_bytes([buf[1], buf[2]]),
        })
    }

    /// Wait for the BUSY bit to clear
    ///
    /// Polls status register 1 every `poll.delay_us` microseconds and fails
    /// with [`Error::Timeout`] once `poll.timeout_us` has been spent.
    pub fn wait_ready(&mut self, poll: Poll) -> Result<(), T::Error> {
        for _ in 0..poll.max_polls() {
            if !self.read_status1()?.is_busy() {
                return Ok(());
            }
            if poll.delay_us > 0 {
                self.transport.delay_us(poll.delay_us);
            }
        }

        log::debug!("flash still busy after {} us", poll.timeout_us);
        Err(Error::Timeout)
    }

    /// Program up to one page
    ///
    /// `data` must not cross a page boundary; the chip would wrap around to
    /// the start of the page. Bits can only go from 1 to 0, so the target
    /// must be erased beforehand.
    pub fn program_page(&mut self, addr: u32, data: &[u8]) -> Result<(), T::Error> {
        if data.is_empty() {
            return Err(Error::EmptyWrite);
        }
        check_range(addr, data.len())?;
        if (addr % PAGE_SIZE) as usize + data.len() > PAGE_SIZE as usize {
            return Err(Error::CrossesPageBoundary {
                addr,
                len: data.len(),
            });
        }

        self.write_enable()?;
        let header = CommandHeader::with_address(opcodes::PP, addr);
        self.transact(&header, data, 0)?;
        self.wait_ready(self.poll.page_program)
    }

    /// Erase the 4KB sector starting at `addr`
    pub fn erase_sector(&mut self, addr: u32) -> Result<(), T::Error> {
        if addr % SECTOR_SIZE != 0 {
            return Err(Error::Misaligned {
                addr,
                alignment: SECTOR_SIZE,
            });
        }
        check_range(addr, SECTOR_SIZE as usize)?;

        self.write_enable()?;
        let header = CommandHeader::with_address(opcodes::SE_20, addr);
        self.transact(&header, &[], 0)?;
        self.wait_ready(self.poll.sector_erase)
    }

    /// Erase the entire chip
    pub fn chip_erase(&mut self) -> Result<(), T::Error> {
        log::info!("Erasing entire chip");
        self.write_enable()?;
        self.transact(&CommandHeader::simple(opcodes::CE_C7), &[], 0)?;
        self.wait_ready(self.poll.chip_erase)
    }

    /// Write `data` starting at `addr`
    ///
    /// With `chip_erase` set the whole chip is erased first; otherwise the
    /// target range must already be erased. Data is programmed page by page,
    /// the first page being shortened so that no program crosses a page
    /// boundary.
    pub fn store(&mut self, addr: u32, data: &[u8], chip_erase: bool) -> Result<(), T::Error> {
        self.store_with_progress(addr, data, chip_erase, |_| {})
    }

    /// Like [`store`](Self::store), reporting the number of bytes programmed
    /// so far after each page
    pub fn store_with_progress<F: FnMut(usize)>(
        &mut self,
        addr: u32,
        data: &[u8],
        chip_erase: bool,
        mut progress: F,
    ) -> Result<(), T::Error> {
        check_range(addr, data.len())?;

        if chip_erase {
            self.chip_erase()?;
        }

        let mut addr = addr;
        let mut rest = data;
        let mut written = 0;

        while !rest.is_empty() {
            let room = (PAGE_SIZE - addr % PAGE_SIZE) as usize;
            let (page, tail) = rest.split_at(room.min(rest.len()));
            self.program_page(addr, page)?;

            addr += page.len() as u32;
            written += page.len();
            rest = tail;
            progress(written);
        }

        Ok(())
    }

    fn read_register(&mut self, opcode: u8) -> Result<u8, T::Error> {
        let buf = self.transact(&CommandHeader::simple(opcode), &[], 1)?;
        Ok(buf[0])
    }

    /// Run one transaction and check the response length
    fn transact(
        &mut self,
        header: &CommandHeader,
        data: &[u8],
        read_len: usize,
    ) -> Result<Vec<u8>, T::Error> {
        let payload = header.to_payload(data);
        log::trace!(
            "spi: opcode 0x{:02X} addr {:?} write {} read {}",
            header.opcode,
            header.address,
            payload.len(),
            read_len
        );

        let rx = self
            .transport
            .write_then_read(payload.len(), read_len, &payload)
            .map_err(Error::Transport)?;

        if rx.len() != read_len {
            return Err(Error::ShortResponse {
                expected: read_len,
                actual: rx.len(),
            });
        }
        Ok(rx)
    }
}

/// Check that `[addr, addr + len)` lies inside the flash
fn check_range<E>(addr: u32, len: usize) -> Result<(), E> {
    if addr as u64 + len as u64 > MAX_WORDS as u64 {
        return Err(Error::OutOfRange {
            addr,
            len: u32::try_from(len).unwrap_or(u32::MAX),
        });
    }
    Ok(())
}
