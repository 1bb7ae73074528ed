//! pyrateflash - Winbond W25Q64FV programmer
//!
//! Reads, writes and erases a W25Q64FV (64 Mbit SPI NOR flash) through a
//! Bus Pirate, or through the in-memory emulator for testing.
//!
//! # Architecture
//!
//! The CLI opens a programmer by name (`pyrateflash-flash`), wraps it in the
//! `W25q64fv` driver (`pyrateflash-core`) and runs one command against it.
//! The programmer is released when the handle drops, which for a Bus Pirate
//! powers the target down and returns the firmware to its terminal.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use pyrateflash_flash::open_programmer;

/// Log level selected by the number of `-v` flags
fn verbosity_level(verbose: u8) -> Option<log::LevelFilter> {
    match verbose {
        0 => None, // RUST_LOG, or info
        1 => Some(log::LevelFilter::Debug),
        _ => Some(log::LevelFilter::Trace),
    }
}

/// Logger configuration; `-v` overrides RUST_LOG
fn logger_builder(verbose: u8) -> env_logger::Builder {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = verbosity_level(verbose) {
        builder.filter_level(level);
    }
    builder
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logger_builder(cli.verbose).init();

    match cli.command {
        Commands::Probe { programmer } => {
            let mut handle = open_programmer(&programmer)?;
            commands::run_probe(&mut handle)
        }
        Commands::Read {
            programmer,
            output,
            start,
            length,
        } => {
            let mut handle = open_programmer(&programmer)?;
            commands::run_read(&mut handle, &output, start, length)
        }
        Commands::Write {
            programmer,
            input,
            start,
            chip_erase,
            verify,
        } => {
            let mut handle = open_programmer(&programmer)?;
            commands::run_write(&mut handle, &input, start, chip_erase, verify)
        }
        Commands::Erase { programmer, sector } => {
            let mut handle = open_programmer(&programmer)?;
            commands::run_erase(&mut handle, sector)
        }
        Commands::Status { programmer } => {
            let mut handle = open_programmer(&programmer)?;
            commands::run_status(&mut handle)
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, LevelFilter, Log, Metadata};

    #[test]
    fn test_verbosity_level() {
        assert_eq!(verbosity_level(0), None);
        assert_eq!(verbosity_level(1), Some(LevelFilter::Debug));
        assert_eq!(verbosity_level(2), Some(LevelFilter::Trace));
        assert_eq!(verbosity_level(5), Some(LevelFilter::Trace));
    }

    #[test]
    fn test_verbose_flags_reach_logger() {
        let debug = Metadata::builder()
            .level(Level::Debug)
            .target("pyrateflash")
            .build();
        let trace = Metadata::builder()
            .level(Level::Trace)
            .target("pyrateflash")
            .build();

        let logger = logger_builder(1).build();
        assert!(logger.filter() >= LevelFilter::Debug);
        assert!(logger.enabled(&debug));

        let logger = logger_builder(2).build();
        assert_eq!(logger.filter(), LevelFilter::Trace);
        assert!(logger.enabled(&trace));
    }
}
