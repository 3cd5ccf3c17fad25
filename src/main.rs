//! partflash - Partition-aware SPIFFS provisioning and coredump retrieval
//!
//! partflash drives the ESP-IDF tools against an ESP32 board:
//!
//! - `provision` packs a directory into a SPIFFS image sized for the `spiffs`
//!   partition (`spiffsgen.py`) and writes it to the board (`esptool.py`)
//! - `dump` reads the `coredump` partition back (`esptool.py`), finds the
//!   matching ELF in the build tree and prints the crash report
//!   (`espcoredump.py`)
//!
//! Partition offsets and sizes always come from the project's
//! `partitions.csv`, so images can't be written past the partition they
//! were built for.

mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;

fn main() {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still wins when set
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_log_filter(cli.verbose)),
    )
    .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load(cli.config.as_deref())?;

    // Global overrides
    if let Some(table) = cli.table {
        config.partition_table = table;
    }
    if let Some(secs) = cli.timeout {
        config.tool_timeout_secs = Some(secs);
    }

    match cli.command {
        Commands::Provision {
            link,
            source,
            image,
            partition,
            chip,
            image_size,
            allow_empty,
            dry_run,
        } => {
            if let Some(baud) = link.baud {
                config.baud = baud;
            }
            if let Some(source) = source {
                config.provision.source_dir = source;
            }
            if let Some(image) = image {
                config.provision.image = image;
            }
            if let Some(partition) = partition {
                config.provision.partition = partition;
            }
            if let Some(chip) = chip {
                config.chip = chip;
            }
            if let Some(image_size) = image_size {
                config.provision.image_size = image_size;
            }
            if allow_empty {
                config.provision.allow_empty_image = true;
            }
            commands::provision::run(&config, link.port.as_deref(), dry_run)
        }
        Commands::Dump {
            link,
            output,
            elf,
            build_dir,
            partition,
            report,
        } => {
            if let Some(baud) = link.baud {
                config.baud = baud;
            }
            if let Some(output) = output {
                config.dump.output = output;
            }
            if let Some(build_dir) = build_dir {
                config.dump.build_dir = build_dir;
            }
            if let Some(partition) = partition {
                config.dump.partition = partition;
            }
            if report.is_some() {
                config.dump.report = report;
            }
            commands::dump::run(&config, link.port.as_deref(), elf.as_deref())
        }
        Commands::Partitions { name, field } => {
            commands::partitions::run(&config, name.as_deref(), field.as_deref())
        }
        Commands::Ports { token } => commands::ports::run(&config, &token),
    }
}

/// Log filter used when RUST_LOG is unset
fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_raises_log_filter() {
        assert_eq!(default_log_filter(0), "info");
        assert_eq!(default_log_filter(1), "debug");
        assert_eq!(default_log_filter(2), "trace");
        assert_eq!(default_log_filter(5), "trace");
    }

    #[test]
    fn test_verbose_filter_enables_debug_records() {
        let logger = env_logger::Builder::new()
            .parse_filters(default_log_filter(1))
            .build();
        let debug = log::Metadata::builder()
            .level(log::Level::Debug)
            .target("partflash")
            .build();
        let trace = log::Metadata::builder()
            .level(log::Level::Trace)
            .target("partflash")
            .build();
        assert!(log::Log::enabled(&logger, &debug));
        assert!(!log::Log::enabled(&logger, &trace));
    }
}
