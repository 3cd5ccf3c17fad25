//! Backends for partflash's external collaborators
//!
//! partflash-core defines image generation, flash transfer and coredump
//! analysis as traits. This crate implements them by running the ESP-IDF
//! Python tools as child processes:
//!
//! - [`Spiffsgen`]: `spiffsgen.py <size> <dir> <image>`
//! - [`Esptool`]: `esptool.py write_flash` / `read_flash`
//! - [`EspCoredump`]: `espcoredump.py info_corefile`
//!
//! [`SystemPorts`] enumerates the host's serial ports through the
//! `serialport` crate.
//!
//! Every tool is described by a [`ToolCommand`], so the same backend works
//! for `esptool.py` on `PATH` as well as `python3 -m esptool`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod coredump;
mod esptool;
mod process;
mod serial;
mod spiffsgen;

pub use coredump::EspCoredump;
pub use esptool::Esptool;
pub use process::{ToolCommand, ToolRunner};
pub use serial::SystemPorts;
pub use spiffsgen::Spiffsgen;
