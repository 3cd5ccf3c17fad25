//! Partition table support
//!
//! A partition table names fixed regions of device flash. partflash reads the
//! CSV tables ESP-IDF projects keep in `partitions.csv`:
//!
//! ```text
//! # Name,   Type, SubType, Offset,   Size,     Flags
//! nvs,      data, nvs,     0x9000,   0x6000,
//! coredump, data, coredump,0x3F0000, 0x10000,
//! spiffs,   data, spiffs,  0x310000, 0x100000,
//! ```
//!
//! The first column is always the partition name, whatever its header says.
//! Other columns are addressed by their trimmed header text:
//!
//! ```ignore
//! let table = PartitionTable::from_csv_file("partitions.csv")?;
//! let offset = table.field("spiffs", "Offset")?;
//! let entry = table.entry("spiffs")?;
//! ```

mod csv;
mod types;

pub use csv::{lookup, PartitionTable};
pub use types::*;
