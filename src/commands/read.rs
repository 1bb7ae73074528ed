//! Read command implementation

use super::{create_progress_bar, READ_WINDOW};
use pyrateflash_core::w25q64fv::MAX_WORDS;
use pyrateflash_core::{SpiTransport, W25q64fv};
use pyrateflash_flash::ProgrammerHandle;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Run the read command
///
/// Without `length`, reads from `start` to the end of the chip.
pub fn run_read(
    handle: &mut ProgrammerHandle,
    output: &Path,
    start: u32,
    length: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let length = length.unwrap_or_else(|| MAX_WORDS.saturating_sub(start));

    let mut flash = handle.flash();
    let data = read_flash_with_progress(&mut flash, start, length)?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);

    Ok(())
}

/// Read `length` bytes from `start` with a progress bar
pub fn read_flash_with_progress<T>(
    flash: &mut W25q64fv<'_, T>,
    start: u32,
    length: u32,
) -> Result<Vec<u8>, Box<dyn std::error::Error>>
where
    T: SpiTransport + ?Sized,
    T::Error: std::error::Error + 'static,
{
    // Reject the whole range before the first window goes out
    if start as u64 + length as u64 > MAX_WORDS as u64 {
        return Err(format!(
            "Read range 0x{:06X}+0x{:X} is outside the chip (0x{:06X} bytes)",
            start, length, MAX_WORDS
        )
        .into());
    }

    let pb = create_progress_bar(length as u64, "Reading")?;
    let mut data = Vec::with_capacity(length as usize);

    let mut offset = 0u32;
    while offset < length {
        let window = READ_WINDOW.min(length - offset);
        let chunk = flash.read(start + offset, window)?;
        data.extend_from_slice(&chunk);

        offset += window;
        pb.set_position(offset as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use pyrateflash_flash::open_programmer;

    #[test]
    fn test_read_spans_windows() {
        let mut handle = open_programmer("dummy").unwrap();
        let mut flash = handle.flash();

        let pattern: Vec<u8> = (0..0x200).map(|i| (i % 253) as u8).collect();
        let start = READ_WINDOW - 0x100;
        flash.store(start, &pattern, false).unwrap();

        let data = read_flash_with_progress(&mut flash, start, 0x200).unwrap();
        assert_eq!(data, pattern);
    }

    #[test]
    fn test_read_rejects_range_past_end() {
        let mut handle = open_programmer("dummy").unwrap();
        let mut flash = handle.flash();
        assert!(read_flash_with_progress(&mut flash, MAX_WORDS - 1, 2).is_err());
    }
}
