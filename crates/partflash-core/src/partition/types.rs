//! Partition types

use thiserror::Error;

/// Column header holding a partition's start address
pub const OFFSET_FIELD: &str = "Offset";

/// Column header holding a partition's length in bytes
pub const SIZE_FIELD: &str = "Size";

/// A named region of device flash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionEntry {
    /// Partition name (unique within its table)
    pub name: String,
    /// Start address in bytes
    pub offset: u64,
    /// Length in bytes, always non-zero
    pub size: u64,
}

impl PartitionEntry {
    /// Offset formatted the way the flashing tool expects it
    pub fn offset_hex(&self) -> String {
        format!("0x{:x}", self.offset)
    }

    /// Size formatted the way the flashing tool expects it
    pub fn size_hex(&self) -> String {
        format!("0x{:x}", self.size)
    }

    /// Last address covered by this partition (inclusive)
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size - 1)
    }
}

/// Errors that can occur when reading a partition table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    /// Table resource could not be read
    #[error("cannot read partition table {path}: {reason}")]
    Unreadable {
        /// Path of the table
        path: String,
        /// Underlying I/O error
        reason: String,
    },
    /// Table has no header row
    #[error("partition table is empty")]
    MissingHeader,
    /// No row whose first column equals the name
    #[error("partition '{0}' not found")]
    PartitionNotFound(String),
    /// Row exists but the requested column does not
    #[error("partition '{partition}' has no field '{field}'")]
    FieldNotFound {
        /// Partition name
        partition: String,
        /// Requested column header
        field: String,
    },
    /// Numeric column could not be parsed
    #[error("partition '{partition}' field '{field}': invalid number '{value}'")]
    InvalidNumber {
        /// Partition name
        partition: String,
        /// Column header
        field: String,
        /// Offending text
        value: String,
    },
    /// Partition has a size of zero
    #[error("partition '{0}' has zero size")]
    EmptyPartition(String),
    /// Two rows share a name
    #[error("duplicate partition name '{0}'")]
    DuplicateName(String),
}

/// Parse a byte quantity as written in partition tables
///
/// Accepts `0x`-prefixed hex, plain decimal and `K`/`M` suffixed decimal
/// (`64K`, `1M`), as ESP-IDF's partition tool does.
pub fn parse_quantity(s: &str) -> Option<u64> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).ok();
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix(['k', 'K']) {
        (n.trim(), 1024)
    } else if let Some(n) = s.strip_suffix(['m', 'M']) {
        (n.trim(), 1024 * 1024)
    } else {
        (s, 1)
    };

    num_str.parse::<u64>().ok()?.checked_mul(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x100000"), Some(0x100000));
        assert_eq!(parse_quantity("0X9000"), Some(0x9000));
        assert_eq!(parse_quantity(" 4096 "), Some(4096));
        assert_eq!(parse_quantity("64K"), Some(64 * 1024));
        assert_eq!(parse_quantity("1M"), Some(1024 * 1024));
        assert_eq!(parse_quantity(""), None);
        assert_eq!(parse_quantity("0xZZ"), None);
        assert_eq!(parse_quantity("twelve"), None);
    }

    #[test]
    fn test_entry_hex_formatting() {
        let entry = PartitionEntry {
            name: "spiffs".into(),
            offset: 0x310000,
            size: 0x100000,
        };
        assert_eq!(entry.offset_hex(), "0x310000");
        assert_eq!(entry.size_hex(), "0x100000");
        assert_eq!(entry.end(), 0x40FFFF);
    }
}
