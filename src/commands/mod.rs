//! CLI command implementations
//!
//! Every command opens a programmer, wraps it in the W25Q64FV driver and
//! reports progress with `indicatif`.

mod erase;
mod list;
mod probe;
mod read;
mod status;
mod verify;
mod write;

pub use erase::run_erase;
pub use list::list_programmers;
pub use probe::run_probe;
pub use read::run_read;
pub use status::run_status;
pub use verify::verify_flash_with_progress;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Bytes fetched per driver call when reading with a progress bar
///
/// Each call is further split into 4 KiB transactions by the driver.
pub const READ_WINDOW: u32 = 64 * 1024;

/// Create a progress bar with a phase label
fn create_progress_bar(total: u64, phase: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Create a ticking spinner for operations without byte progress
fn create_spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}
