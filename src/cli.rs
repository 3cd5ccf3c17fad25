//! CLI argument parsing

use clap::{Parser, Subcommand};
use partflash_core::pipeline::ImageSize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "partflash")]
#[command(
    author,
    version,
    about = "Partition-aware SPIFFS provisioning and coredump retrieval for ESP32 boards",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML)
    /// Defaults to ./partflash.toml when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Partition table (ESP-IDF CSV)
    #[arg(short = 't', long, global = true)]
    pub table: Option<PathBuf>,

    /// Kill external tools after this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Serial link options shared across commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LinkArgs {
    /// Serial port (enumerated when omitted)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a SPIFFS image from a directory and flash it
    Provision {
        #[command(flatten)]
        link: LinkArgs,

        /// Directory to pack into the image
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Where to write the generated image
        #[arg(short, long)]
        image: Option<PathBuf>,

        /// Filesystem partition name
        #[arg(long)]
        partition: Option<String>,

        /// Chip name passed to esptool (e.g. esp32s3)
        #[arg(short, long)]
        chip: Option<String>,

        /// Image size policy [aligned, partition]
        #[arg(long)]
        image_size: Option<ImageSize>,

        /// Accept a source directory with no content
        #[arg(long)]
        allow_empty: bool,

        /// Check capacity only, don't generate or flash
        #[arg(long)]
        dry_run: bool,
    },

    /// Read the coredump partition and analyze it
    Dump {
        #[command(flatten)]
        link: LinkArgs,

        /// Where to write the raw dump
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Debug binary (searched in the build tree when omitted)
        #[arg(short, long)]
        elf: Option<PathBuf>,

        /// Build tree searched for debug binaries
        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Coredump partition name
        #[arg(long)]
        partition: Option<String>,

        /// Also write the analysis report to this file
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Show the partition table, or one field of one partition
    Partitions {
        /// Partition to show
        #[arg(short, long)]
        name: Option<String>,

        /// Column to print for --name (e.g. Offset, Size, Type)
        #[arg(short, long, requires = "name")]
        field: Option<String>,
    },

    /// List serial ports and mark device candidates
    Ports {
        /// Extra substrings identifying device ports (comma-separated)
        #[arg(long, value_delimiter = ',')]
        token: Vec<String>,
    },
}
