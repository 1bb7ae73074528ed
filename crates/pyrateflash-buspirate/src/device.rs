//! Bus Pirate device implementation
//!
//! [`BusPirate`] drives the binary SPI mode of the firmware and implements
//! the [`SpiTransport`] trait so the flash driver can run on top of it.

use crate::error::{BusPirateError, Result};
use crate::protocol::*;
use crate::transport::Transport;

use pyrateflash_core::transport::SpiTransport;

/// Bus Pirate in binary SPI mode
///
/// Construction switches the firmware from its user terminal into raw
/// bitbang mode and then into SPI mode. Dropping the device turns the
/// peripherals off and hands the firmware back to the terminal.
pub struct BusPirate<T: Transport> {
    /// Serial link to the firmware
    transport: T,
    /// Transaction strategy, fixed at construction
    mode: TransferMode,
    /// Last peripheral state written
    peripherals: Peripherals,
    /// Firmware mode the host last put the device in
    firmware: FirmwareMode,
}

/// Where the firmware is in the mode ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FirmwareMode {
    Terminal,
    Bitbang,
    Spi,
}

impl<T: Transport> BusPirate<T> {
    /// Create a new Bus Pirate instance with the given transport
    ///
    /// This performs initialization:
    /// 1. Enter raw bitbang mode (`BBIO1`)
    /// 2. Enter binary SPI mode (`SPI1`)
    pub fn new(transport: T, mode: TransferMode) -> Result<Self> {
        let mut bp = Self {
            transport,
            mode,
            peripherals: Peripherals::empty(),
            firmware: FirmwareMode::Terminal,
        };

        // On failure `bp` drops here and shutdown undoes whatever was entered
        bp.enter_bitbang()?;
        bp.firmware = FirmwareMode::Bitbang;
        log::debug!("buspirate: Raw bitbang mode active");

        bp.enter_spi()?;
        bp.firmware = FirmwareMode::Spi;
        log::debug!("buspirate: Binary SPI mode active ({:?} transfers)", mode);

        Ok(bp)
    }

    /// Transaction strategy in use
    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Peripheral state last written with [`set_peripherals`](Self::set_peripherals)
    pub fn peripherals(&self) -> Peripherals {
        self.peripherals
    }

    /// Set the SPI clock rate
    pub fn set_speed(&mut self, speed: SpiSpeed) -> Result<()> {
        self.command(speed.command())?;
        log::debug!("buspirate: SPI speed set to {}", speed);
        Ok(())
    }

    /// Set output type, clock polarity and sampling edge
    pub fn configure(&mut self, config: SpiConfig) -> Result<()> {
        self.command(SPI_CONFIG | config.bits())?;
        log::debug!("buspirate: SPI configured ({:?})", config);
        Ok(())
    }

    /// Switch power supplies, pull-ups, AUX and idle chip select
    pub fn set_peripherals(&mut self, peripherals: Peripherals) -> Result<()> {
        self.command(SPI_PERIPHERALS | peripherals.bits())?;
        self.peripherals = peripherals;
        log::debug!("buspirate: Peripherals set to {:?}", peripherals);
        Ok(())
    }

    /// Assert chip select
    pub fn cs_low(&mut self) -> Result<()> {
        self.command(SPI_CS_LOW)
    }

    /// Release chip select
    pub fn cs_high(&mut self) -> Result<()> {
        self.command(SPI_CS_HIGH)
    }

    /// Clock out `write_data` and clock in `read_len` bytes within one
    /// chip-select frame
    pub fn transfer(&mut self, write_data: &[u8], read_len: usize) -> Result<Vec<u8>> {
        match self.mode {
            TransferMode::WriteThenRead => self.write_then_read_command(write_data, read_len),
            TransferMode::Bulk => self.bulk_transfer(write_data, read_len),
        }
    }

    /// Turn the peripherals off and return the firmware to its terminal
    ///
    /// Called on drop, including when [`new`](Self::new) fails after bitbang
    /// mode was entered. Failures are logged and otherwise ignored.
    pub fn shutdown(&mut self) {
        let firmware = std::mem::replace(&mut self.firmware, FirmwareMode::Terminal);

        if firmware == FirmwareMode::Spi {
            if let Err(e) = self.command(SPI_PERIPHERALS) {
                log::warn!("buspirate: Failed to switch peripherals off: {}", e);
            } else {
                self.peripherals = Peripherals::empty();
                log::debug!("buspirate: Peripherals off");
            }

            if let Err(e) = self.leave_spi() {
                log::warn!("buspirate: Failed to leave SPI mode: {}", e);
            }
        }

        if firmware != FirmwareMode::Terminal {
            if let Err(e) = self.reset_to_terminal() {
                log::warn!("buspirate: Failed to leave binary mode: {}", e);
            }
        }
    }

    // ---- Protocol implementation ----

    /// Send 0x00 until the firmware answers with `BBIO1`
    ///
    /// The firmware needs up to 20 resets to get out of whatever menu the
    /// terminal was in. Every reset already in binary mode produces another
    /// banner, so anything left over is drained afterwards.
    fn enter_bitbang(&mut self) -> Result<()> {
        self.transport.clear_input()?;

        let mut seen = Vec::new();
        let mut buf = [0u8; 64];
        for attempt in 1..=BBIO_ENTRY_ATTEMPTS {
            self.transport.write(&[BBIO_RESET])?;
            self.transport.flush()?;

            let n = self.transport.read_nonblock(&mut buf, 10)?;
            seen.extend_from_slice(&buf[..n]);

            if contains(&seen, BBIO_BANNER) {
                log::trace!("buspirate: BBIO1 after {} resets", attempt);
                self.drain()?;
                return Ok(());
            }
        }

        log::debug!(
            "buspirate: No binary mode banner, got {:?}",
            String::from_utf8_lossy(&seen)
        );
        Err(BusPirateError::SyncFailed)
    }

    fn enter_spi(&mut self) -> Result<()> {
        self.transport.write(&[BBIO_ENTER_SPI])?;
        self.transport.flush()?;

        let mut banner = [0u8; 4];
        self.transport.read(&mut banner)?;
        if &banner != SPI_BANNER {
            return Err(BusPirateError::UnexpectedBanner {
                expected: String::from_utf8_lossy(SPI_BANNER).into_owned(),
                got: String::from_utf8_lossy(&banner).into_owned(),
            });
        }
        Ok(())
    }

    /// 0x00 in SPI mode drops back to raw bitbang
    fn leave_spi(&mut self) -> Result<()> {
        self.transport.write(&[BBIO_RESET])?;
        self.transport.flush()?;
        let mut banner = [0u8; 5];
        self.transport.read(&mut banner)?;
        if &banner != BBIO_BANNER {
            log::debug!(
                "buspirate: Unexpected reply {:?} to bitbang reset",
                String::from_utf8_lossy(&banner)
            );
        }
        Ok(())
    }

    fn reset_to_terminal(&mut self) -> Result<()> {
        self.transport.write(&[BBIO_RESET_TERMINAL])?;
        self.transport.flush()?;
        log::debug!("buspirate: Returned to terminal mode");
        Ok(())
    }

    /// Discard pending input
    fn drain(&mut self) -> Result<()> {
        let mut buf = [0u8; 64];
        for _ in 0..64 {
            if self.transport.read_nonblock(&mut buf, 10)? == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Send a single-byte command and check the ACK
    fn command(&mut self, cmd: u8) -> Result<()> {
        self.transport.write(&[cmd])?;
        self.transport.flush()?;
        self.expect_ack(cmd)
    }

    fn expect_ack(&mut self, cmd: u8) -> Result<()> {
        let mut response = [0u8];
        self.transport.read(&mut response)?;

        match response[0] {
            BP_ACK => Ok(()),
            BP_NAK => Err(BusPirateError::Nak(cmd)),
            other => Err(BusPirateError::InvalidResponse {
                command: cmd,
                response: other,
            }),
        }
    }

    fn write_then_read_command(&mut self, write_data: &[u8], read_len: usize) -> Result<Vec<u8>> {
        let frame = write_then_read_frame(write_data, read_len)?;
        self.transport.write(&frame)?;
        self.transport.flush()?;
        self.expect_ack(SPI_WRITE_THEN_READ)?;

        let mut data = vec![0u8; read_len];
        if read_len > 0 {
            self.transport.read(&mut data)?;
        }
        Ok(data)
    }

    fn bulk_transfer(&mut self, write_data: &[u8], read_len: usize) -> Result<Vec<u8>> {
        for len in [write_data.len(), read_len] {
            if len > MAX_WRITE_THEN_READ {
                return Err(BusPirateError::TransferTooLong {
                    len,
                    max: MAX_WRITE_THEN_READ,
                });
            }
        }

        self.cs_low()?;
        let result = self.bulk_exchange(write_data, read_len);
        // Release chip select even when the exchange failed
        let released = self.cs_high();
        let data = result?;
        released?;
        Ok(data)
    }

    fn bulk_exchange(&mut self, write_data: &[u8], read_len: usize) -> Result<Vec<u8>> {
        for chunk in write_data.chunks(MAX_BULK) {
            self.bulk(chunk)?;
        }

        let filler = [0xFFu8; MAX_BULK];
        let mut data = Vec::with_capacity(read_len);
        while data.len() < read_len {
            let len = (read_len - data.len()).min(MAX_BULK);
            data.extend(self.bulk(&filler[..len])?);
        }
        Ok(data)
    }

    /// Exchange 1-16 bytes, returning what was clocked in
    fn bulk(&mut self, out: &[u8]) -> Result<Vec<u8>> {
        let cmd = bulk_command(out.len());
        self.transport.write(&[cmd])?;
        self.transport.write(out)?;
        self.transport.flush()?;
        self.expect_ack(cmd)?;

        let mut data = vec![0u8; out.len()];
        self.transport.read(&mut data)?;
        Ok(data)
    }
}

impl<T: Transport> Drop for BusPirate<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<T: Transport> SpiTransport for BusPirate<T> {
    type Error = BusPirateError;

    fn write_then_read(
        &mut self,
        write_len: usize,
        read_len: usize,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        let write_data = payload.get(..write_len).ok_or_else(|| {
            BusPirateError::InvalidParameter(format!(
                "write length {} exceeds payload of {} bytes",
                write_len,
                payload.len()
            ))
        })?;
        self.transfer(write_data, read_len)
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pyrateflash_core::w25q64fv::W25q64fv;
    use pyrateflash_core::Error as CoreError;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Mode {
        Terminal,
        Bitbang,
        Spi,
    }

    /// Firmware model answering the binary protocol byte by byte
    struct FakeFirmware {
        mode: Mode,
        /// Resets to swallow before the first banner
        silent_resets: usize,
        /// Never answer at all
        dead: bool,
        /// Answer write-then-read with NAK
        nak_write_then_read: bool,
        /// Banner sent for SPI entry; anything but `SPI1` leaves the mode alone
        spi_banner: &'static [u8],
        rx: VecDeque<u8>,
        pending: Vec<u8>,
        resets: usize,
        /// Every byte the host wrote
        written: Vec<u8>,
        /// Configuration commands (0x4x, 0x6x, 0x8x)
        settings: Vec<u8>,
        /// Chip select transitions, true when asserted
        cs_events: Vec<bool>,
        /// Write-then-read frames seen: (write data, read length)
        frames: Vec<(Vec<u8>, usize)>,
        /// Reply data for write-then-read
        reply: Vec<u8>,
        /// Bytes clocked out with bulk transfers
        bulk_out: Vec<u8>,
        /// Bytes clocked in with bulk transfers
        miso: VecDeque<u8>,
    }

    impl FakeFirmware {
        fn new() -> Self {
            Self {
                mode: Mode::Terminal,
                silent_resets: 0,
                dead: false,
                nak_write_then_read: false,
                spi_banner: SPI_BANNER,
                rx: VecDeque::new(),
                pending: Vec::new(),
                resets: 0,
                written: Vec::new(),
                settings: Vec::new(),
                cs_events: Vec::new(),
                frames: Vec::new(),
                reply: Vec::new(),
                bulk_out: Vec::new(),
                miso: VecDeque::new(),
            }
        }

        fn push(&mut self, bytes: &[u8]) {
            self.rx.extend(bytes.iter().copied());
        }

        /// Handle one complete command from `pending`, returning false when
        /// more bytes are needed
        fn step(&mut self) -> bool {
            let Some(&cmd) = self.pending.first() else {
                return false;
            };

            let consumed = match self.mode {
                Mode::Terminal | Mode::Bitbang => {
                    match cmd {
                        0x00 => {
                            self.resets += 1;
                            if self.resets > self.silent_resets {
                                self.mode = Mode::Bitbang;
                                self.push(BBIO_BANNER);
                            }
                        }
                        0x01 if self.mode == Mode::Bitbang => {
                            if self.spi_banner == SPI_BANNER {
                                self.mode = Mode::Spi;
                            }
                            self.push(self.spi_banner);
                        }
                        0x0F if self.mode == Mode::Bitbang => {
                            self.mode = Mode::Terminal;
                            self.push(&[BP_ACK]);
                        }
                        _ => {}
                    }
                    1
                }
                Mode::Spi => match cmd {
                    0x00 => {
                        self.mode = Mode::Bitbang;
                        self.push(BBIO_BANNER);
                        1
                    }
                    SPI_CS_LOW | SPI_CS_HIGH => {
                        self.cs_events.push(cmd == SPI_CS_LOW);
                        self.push(&[BP_ACK]);
                        1
                    }
                    SPI_WRITE_THEN_READ => {
                        if self.pending.len() < 5 {
                            return false;
                        }
                        let wlen = u16::from_be_bytes([self.pending[1], self.pending[2]]) as usize;
                        let rlen = u16::from_be_bytes([self.pending[3], self.pending[4]]) as usize;
                        if self.pending.len() < 5 + wlen {
                            return false;
                        }
                        if self.nak_write_then_read {
                            self.push(&[BP_NAK]);
                        } else {
                            self.frames.push((self.pending[5..5 + wlen].to_vec(), rlen));
                            self.push(&[BP_ACK]);
                            let reply: Vec<u8> = (0..rlen)
                                .map(|i| self.reply.get(i).copied().unwrap_or(0xFF))
                                .collect();
                            self.push(&reply);
                        }
                        5 + wlen
                    }
                    0x10..=0x1F => {
                        let len = (cmd & 0x0F) as usize + 1;
                        if self.pending.len() < 1 + len {
                            return false;
                        }
                        self.bulk_out.extend_from_slice(&self.pending[1..1 + len]);
                        self.push(&[BP_ACK]);
                        for _ in 0..len {
                            let b = self.miso.pop_front().unwrap_or(0xFF);
                            self.rx.push_back(b);
                        }
                        1 + len
                    }
                    0x40..=0x4F | 0x60..=0x67 | 0x80..=0x8F => {
                        self.settings.push(cmd);
                        self.push(&[BP_ACK]);
                        1
                    }
                    _ => {
                        self.push(&[BP_NAK]);
                        1
                    }
                },
            };

            self.pending.drain(..consumed);
            true
        }
    }

    impl Transport for FakeFirmware {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.written.extend_from_slice(data);
            if self.dead {
                return Ok(());
            }
            self.pending.extend_from_slice(data);
            while self.step() {}
            Ok(())
        }

        fn read(&mut self, buf: &mut [u8]) -> Result<()> {
            if self.rx.len() < buf.len() {
                return Err(BusPirateError::Timeout);
            }
            for b in buf.iter_mut() {
                *b = self.rx.pop_front().unwrap();
            }
            Ok(())
        }

        fn read_nonblock(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize> {
            let n = buf.len().min(self.rx.len());
            for b in buf[..n].iter_mut() {
                *b = self.rx.pop_front().unwrap();
            }
            Ok(n)
        }

        fn clear_input(&mut self) -> Result<()> {
            self.rx.clear();
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_enters_spi_mode() {
        let mut fw = FakeFirmware::new();
        let bp = BusPirate::new(&mut fw, TransferMode::WriteThenRead).unwrap();
        assert_eq!(bp.mode(), TransferMode::WriteThenRead);
        drop(bp);

        assert_eq!(&fw.written[..2], &[0x00, 0x01]);
    }

    #[test]
    fn test_bitbang_entry_retries() {
        let mut fw = FakeFirmware::new();
        fw.silent_resets = 7;
        let bp = BusPirate::new(&mut fw, TransferMode::WriteThenRead).unwrap();
        drop(bp);

        // 8 resets to get a banner, then SPI entry
        assert_eq!(&fw.written[..9], &[0, 0, 0, 0, 0, 0, 0, 0, 0x01]);
    }

    #[test]
    fn test_bitbang_entry_gives_up() {
        let mut fw = FakeFirmware::new();
        fw.dead = true;
        let err = BusPirate::new(&mut fw, TransferMode::WriteThenRead)
            .err()
            .unwrap();
        assert!(matches!(err, BusPirateError::SyncFailed));
        assert_eq!(fw.written, vec![0x00; BBIO_ENTRY_ATTEMPTS]);
    }

    #[test]
    fn test_spi_entry_failure_returns_to_terminal() {
        let mut fw = FakeFirmware::new();
        fw.spi_banner = b"I2C1";
        let err = BusPirate::new(&mut fw, TransferMode::WriteThenRead)
            .err()
            .unwrap();
        assert!(matches!(err, BusPirateError::UnexpectedBanner { .. }));

        // Straight from bitbang to terminal, no SPI-mode commands
        assert_eq!(fw.written, vec![0x00, 0x01, 0x0F]);
        assert_eq!(fw.mode, Mode::Terminal);
        assert!(fw.settings.is_empty());
    }

    #[test]
    fn test_configuration_commands() {
        let mut fw = FakeFirmware::new();
        {
            let mut bp = BusPirate::new(&mut fw, TransferMode::WriteThenRead).unwrap();
            bp.set_peripherals(Peripherals::POWER | Peripherals::CS).unwrap();
            bp.configure(SpiConfig::OUTPUT_3V3 | SpiConfig::CLK_EDGE).unwrap();
            bp.set_speed(SpiSpeed::Mhz1).unwrap();
            assert_eq!(bp.peripherals(), Peripherals::POWER | Peripherals::CS);
        }

        // Shutdown switches everything off again
        assert_eq!(fw.settings, vec![0x49, 0x8A, 0x63, 0x40]);
        assert_eq!(fw.mode, Mode::Terminal);
        assert_eq!(&fw.written[fw.written.len() - 2..], &[0x00, 0x0F]);
    }

    #[test]
    fn test_driver_read_over_write_then_read() {
        let mut fw = FakeFirmware::new();
        fw.reply = (0u8..8).collect();
        {
            let mut bp = BusPirate::new(&mut fw, TransferMode::WriteThenRead).unwrap();
            let mut flash = W25q64fv::new(&mut bp);
            let data = flash.read(0x000100, 8).unwrap();
            assert_eq!(data, (0u8..8).collect::<Vec<_>>());
        }

        assert_eq!(fw.frames, vec![(vec![0x03, 0x00, 0x01, 0x00], 8)]);
        // The firmware frames chip select itself
        assert!(fw.cs_events.is_empty());
    }

    #[test]
    fn test_driver_status_registers() {
        let mut fw = FakeFirmware::new();
        fw.reply = vec![0x02];
        {
            let mut bp = BusPirate::new(&mut fw, TransferMode::WriteThenRead).unwrap();
            let mut flash = W25q64fv::new(&mut bp);
            assert_eq!(flash.status_registers().unwrap(), [0x02, 0x02]);
        }

        assert_eq!(fw.frames, vec![(vec![0x05], 1), (vec![0x35], 1)]);
    }

    #[test]
    fn test_write_then_read_nak() {
        let mut fw = FakeFirmware::new();
        fw.nak_write_then_read = true;
        let mut bp = BusPirate::new(&mut fw, TransferMode::WriteThenRead).unwrap();
        let mut flash = W25q64fv::new(&mut bp);

        let err = flash.read_status1().unwrap_err();
        assert!(matches!(
            err,
            CoreError::Transport(BusPirateError::Nak(SPI_WRITE_THEN_READ))
        ));
    }

    #[test]
    fn test_bulk_transfer() {
        let mut fw = FakeFirmware::new();
        // Bytes clocked in while the command goes out are discarded
        fw.miso.extend([0xAA; 4]);
        fw.miso.extend(0u8..20);
        {
            let mut bp = BusPirate::new(&mut fw, TransferMode::Bulk).unwrap();
            let data = bp.write_then_read(4, 20, &[0x03, 0x00, 0x00, 0x00]).unwrap();
            assert_eq!(data, (0u8..20).collect::<Vec<_>>());
        }

        assert_eq!(fw.cs_events, vec![true, false]);
        assert!(fw.frames.is_empty());
        let mut expected = vec![0x03, 0x00, 0x00, 0x00];
        expected.extend([0xFF; 20]);
        assert_eq!(fw.bulk_out, expected);
    }

    #[test]
    fn test_bulk_write_only() {
        let mut fw = FakeFirmware::new();
        {
            let mut bp = BusPirate::new(&mut fw, TransferMode::Bulk).unwrap();
            let data = bp.write_then_read(1, 0, &[0x06]).unwrap();
            assert!(data.is_empty());
        }

        assert_eq!(fw.bulk_out, vec![0x06]);
        assert_eq!(fw.cs_events, vec![true, false]);
    }

    #[test]
    fn test_write_len_exceeds_payload() {
        let mut fw = FakeFirmware::new();
        let mut bp = BusPirate::new(&mut fw, TransferMode::WriteThenRead).unwrap();
        let err = bp.write_then_read(4, 0, &[0x03]).unwrap_err();
        assert!(matches!(err, BusPirateError::InvalidParameter(_)));
    }

    #[test]
    fn test_oversized_transfer_rejected() {
        let mut fw = FakeFirmware::new();
        let mut bp = BusPirate::new(&mut fw, TransferMode::WriteThenRead).unwrap();
        let err = bp.transfer(&[0x03, 0, 0, 0], 4097).unwrap_err();
        assert!(matches!(err, BusPirateError::TransferTooLong { len: 4097, .. }));
    }
}
