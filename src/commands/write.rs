//! Write command implementation

use super::{create_progress_bar, create_spinner, verify_flash_with_progress};
use pyrateflash_core::w25q64fv::{MAX_WORDS, PAGE_SIZE};
use pyrateflash_flash::ProgrammerHandle;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Run the write command
///
/// Programs the file page by page starting at `start`. Without
/// `chip_erase` the target range must already be erased.
pub fn run_write(
    handle: &mut ProgrammerHandle,
    input: &Path,
    start: u32,
    chip_erase: bool,
    do_verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // Read input file
    let mut file = File::open(input)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    println!("Read {} bytes from {:?}", data.len(), input);

    // Validate size
    if start as u64 + data.len() as u64 > MAX_WORDS as u64 {
        return Err(format!(
            "File size ({} bytes) at 0x{:06X} exceeds chip size ({} bytes)",
            data.len(),
            start,
            MAX_WORDS
        )
        .into());
    }
    if data.is_empty() && !chip_erase {
        println!("Nothing to write");
        return Ok(());
    }

    let mut flash = handle.flash();

    if chip_erase {
        let pb = create_spinner(format!(
            "Erasing {} bytes (this may take a while)...",
            MAX_WORDS
        ))?;
        flash.chip_erase()?;
        pb.finish_with_message("Erase complete");
    }

    let pb = create_progress_bar(data.len() as u64, "Writing")?;
    flash.store_with_progress(start, &data, false, |written| {
        pb.set_position(written as u64)
    })?;
    pb.finish_with_message("Write complete");

    log::debug!(
        "Programmed {} pages",
        pages_touched(start, data.len() as u32)
    );

    if do_verify {
        verify_flash_with_progress(&mut flash, start, &data)?;
    }

    println!("Write complete!");

    Ok(())
}

/// Number of page program commands needed for `len` bytes at `start`
fn pages_touched(start: u32, len: u32) -> u32 {
    if len == 0 {
        return 0;
    }
    let first = start / PAGE_SIZE;
    let last = (start + len - 1) / PAGE_SIZE;
    last - first + 1
}
