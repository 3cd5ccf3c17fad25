//! External collaborator interfaces
//!
//! Image generation, flash transfer and coredump analysis are done by other
//! programs. partflash only decides when to run them and with what; each
//! trait here is one such program seen as a blocking call returning an
//! [`Outcome`].

use std::path::{Path, PathBuf};

use crate::error::Outcome;

/// Coredump encoding passed to the dump analyzer
pub const COREDUMP_FORMAT: &str = "elf";

/// Builds a filesystem image from a directory
pub trait ImagePackager {
    /// Produce an image of `target_size` bytes at `output` from `source_dir`
    fn package(&self, target_size: u64, source_dir: &Path, output: &Path) -> Outcome;
}

/// Parameters for a flash write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    /// Target chip identifier (e.g. "esp32s3")
    pub chip: String,
    /// Serial port of the device
    pub port: String,
    /// Serial baud rate
    pub baud: u32,
    /// Flash address, hex formatted
    pub offset_hex: String,
    /// Image to write
    pub image: PathBuf,
}

/// Writes an image to device flash
pub trait FlashWriter {
    /// Write `request.image` at `request.offset_hex`
    fn write(&self, request: &WriteRequest) -> Outcome;
}

/// Parameters for a flash read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    /// Serial port of the device
    pub port: String,
    /// Serial baud rate
    pub baud: u32,
    /// Flash address, hex formatted
    pub offset_hex: String,
    /// Number of bytes, hex formatted
    pub size_hex: String,
    /// File receiving the region
    pub output: PathBuf,
}

/// Reads a flash region into a local file
pub trait FlashReader {
    /// Read the region described by `request` into `request.output`
    fn read(&self, request: &ReadRequest) -> Outcome;
}

/// Turns a raw coredump into a crash report
pub trait DumpAnalyzer {
    /// Analyze `dump` against the symbols in `elf`, returning the report text
    fn analyze(&self, dump: &Path, elf: &Path, format: &str) -> Outcome<String>;
}
