//! Read-back verification

use super::{create_progress_bar, READ_WINDOW};
use pyrateflash_core::{SpiTransport, W25q64fv};

/// Verify flash contents at `start` against expected data with progress bar
///
/// Fails at the first differing byte.
pub fn verify_flash_with_progress<T>(
    flash: &mut W25q64fv<'_, T>,
    start: u32,
    expected: &[u8],
) -> Result<(), Box<dyn std::error::Error>>
where
    T: SpiTransport + ?Sized,
    T::Error: std::error::Error + 'static,
{
    let pb = create_progress_bar(expected.len() as u64, "Verifying")?;

    for (index, expected_chunk) in expected.chunks(READ_WINDOW as usize).enumerate() {
        let offset = index * READ_WINDOW as usize;
        let chunk = flash.read(start + offset as u32, expected_chunk.len() as u32)?;

        if let Some(i) = first_mismatch(&chunk, expected_chunk) {
            pb.abandon_with_message("Verification failed!");
            return Err(format!(
                "Verification failed at address 0x{:06X}: expected 0x{:02X}, got 0x{:02X}",
                start as usize + offset + i,
                expected_chunk[i],
                chunk[i]
            )
            .into());
        }

        pb.set_position((offset + expected_chunk.len()) as u64);
    }

    pb.finish_with_message("Verification passed");
    Ok(())
}

fn first_mismatch(actual: &[u8], expected: &[u8]) -> Option<usize> {
    actual.iter().zip(expected).position(|(a, b)| a != b)
}
