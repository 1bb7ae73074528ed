//! Erase command implementation

use super::create_spinner;
use pyrateflash_core::w25q64fv::{MAX_WORDS, SECTOR_SIZE};
use pyrateflash_flash::ProgrammerHandle;

/// Run the erase command
///
/// Erases the 4 KiB sector at `sector` if given, otherwise the whole chip.
pub fn run_erase(
    handle: &mut ProgrammerHandle,
    sector: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut flash = handle.flash();

    match sector {
        Some(addr) => {
            if addr % SECTOR_SIZE != 0 {
                return Err(format!(
                    "Sector address 0x{:06X} is not aligned to {} bytes",
                    addr, SECTOR_SIZE
                )
                .into());
            }

            let pb = create_spinner(format!("Erasing sector at 0x{:06X}...", addr))?;
            flash.erase_sector(addr)?;
            pb.finish_with_message(format!(
                "Erased {} bytes starting at 0x{:06X}",
                SECTOR_SIZE, addr
            ));
        }
        None => {
            let pb = create_spinner(format!(
                "Erasing {} bytes (this may take a while)...",
                MAX_WORDS
            ))?;
            flash.chip_erase()?;
            pb.finish_with_message(format!("Erased {} bytes", MAX_WORDS));
        }
    }

    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use pyrateflash_flash::open_programmer;

    #[test]
    fn test_erase_sector_only() {
        let mut handle = open_programmer("dummy").unwrap();
        {
            let mut flash = handle.flash();
            flash.store(0x0FFE, &[0u8; 4], false).unwrap();
        }

        run_erase(&mut handle, Some(0x1000)).unwrap();

        let data = handle.flash().read(0x0FFE, 4).unwrap();
        assert_eq!(data, [0x00, 0x00, 0xFF, 0xFF]);
    }

    #[test]
    fn test_erase_misaligned_sector() {
        let mut handle = open_programmer("dummy").unwrap();
        assert!(run_erase(&mut handle, Some(0x1001)).is_err());
    }
}
