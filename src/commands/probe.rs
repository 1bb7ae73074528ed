//! Probe command implementation

use pyrateflash_core::w25q64fv::{MAX_WORDS, W25Q64FV_JEDEC_ID};
use pyrateflash_flash::ProgrammerHandle;

/// Read the JEDEC ID and report whether it is a W25Q64FV
///
/// A different ID is only a warning; the driver is still usable on
/// compatible parts.
pub fn run_probe(handle: &mut ProgrammerHandle) -> Result<(), Box<dyn std::error::Error>> {
    let mut flash = handle.flash();
    let id = flash.read_jedec_id()?;

    println!(
        "JEDEC ID: {:02X} {:04X}",
        id.manufacturer, id.device
    );

    if id == W25Q64FV_JEDEC_ID {
        println!("Found flash chip:");
        println!("  Vendor: Winbond");
        println!("  Name:   W25Q64FV");
        println!("  Size:   {} bytes ({} KiB)", MAX_WORDS, MAX_WORDS / 1024);
    } else if id.manufacturer == 0xFF || id.manufacturer == 0x00 {
        log::warn!("No flash chip responded (check wiring and power)");
    } else {
        log::warn!(
            "Unexpected JEDEC ID {:02X} {:04X}, expected {:02X} {:04X} (W25Q64FV)",
            id.manufacturer,
            id.device,
            W25Q64FV_JEDEC_ID.manufacturer,
            W25Q64FV_JEDEC_ID.device
        );
    }

    Ok(())
}
