//! CSV partition table parsing

use std::fs;
use std::path::Path;

use super::{parse_quantity, PartitionEntry, PartitionError, OFFSET_FIELD, SIZE_FIELD};

/// A parsed partition table
///
/// Cells are kept as text; numbers are only parsed when an entry is asked
/// for, so a malformed column that is never used does not fail the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl PartitionTable {
    /// Load a partition table from a CSV file
    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self, PartitionError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PartitionError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let table = Self::from_csv_str(&content)?;
        log::debug!(
            "Loaded {} partitions from {}",
            table.rows.len(),
            path.display()
        );
        Ok(table)
    }

    /// Parse a partition table from CSV text
    ///
    /// The first non-blank line is the header. Later lines that are blank or
    /// start with `#` are comments.
    pub fn from_csv_str(content: &str) -> Result<Self, PartitionError> {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or(PartitionError::MissingHeader)?
            .split(',')
            .map(|cell| cell.trim().to_string())
            .collect();

        let mut rows: Vec<Vec<String>> = Vec::new();
        for line in lines {
            if line.trim_start().starts_with('#') {
                continue;
            }
            let row: Vec<String> = line.split(',').map(str::to_string).collect();
            if rows.iter().any(|r| r[0] == row[0]) {
                return Err(PartitionError::DuplicateName(row[0].clone()));
            }
            rows.push(row);
        }

        Ok(Self { header, rows })
    }

    /// Header cells, trimmed
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Number of partition rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no partitions
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn row(&self, name: &str) -> Option<&Vec<String>> {
        self.rows.iter().find(|r| r[0] == name)
    }

    /// Look up one field of one partition
    ///
    /// The row is matched by exact equality on the first column; the field by
    /// case-sensitive equality on the trimmed header. The value is trimmed,
    /// and an empty value counts as absent.
    pub fn field(&self, name: &str, field: &str) -> Result<&str, PartitionError> {
        let row = self
            .row(name)
            .ok_or_else(|| PartitionError::PartitionNotFound(name.to_string()))?;

        let not_found = || PartitionError::FieldNotFound {
            partition: name.to_string(),
            field: field.to_string(),
        };

        let column = self
            .header
            .iter()
            .position(|h| h == field)
            .ok_or_else(not_found)?;

        match row.get(column).map(|v| v.trim()) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(not_found()),
        }
    }

    /// Resolve a partition's offset and size
    pub fn entry(&self, name: &str) -> Result<PartitionEntry, PartitionError> {
        let offset = self.number(name, OFFSET_FIELD)?;
        let size = self.number(name, SIZE_FIELD)?;
        if size == 0 {
            return Err(PartitionError::EmptyPartition(name.to_string()));
        }

        Ok(PartitionEntry {
            name: name.to_string(),
            offset,
            size,
        })
    }

    /// All partitions whose offset and size parse, in file order
    pub fn entries(&self) -> Vec<PartitionEntry> {
        self.rows
            .iter()
            .filter_map(|row| match self.entry(&row[0]) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::debug!("Skipping partition row '{}': {}", row[0].trim(), e);
                    None
                }
            })
            .collect()
    }

    fn number(&self, name: &str, field: &str) -> Result<u64, PartitionError> {
        let value = self.field(name, field)?;
        parse_quantity(value).ok_or_else(|| PartitionError::InvalidNumber {
            partition: name.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

/// Read `table_source` and return one field of one partition
///
/// Convenience for single lookups; the file is read on every call.
pub fn lookup(
    table_source: impl AsRef<Path>,
    name: &str,
    field: &str,
) -> Result<String, PartitionError> {
    let table = PartitionTable::from_csv_file(table_source)?;
    table.field(name, field).map(str::to_string)
}
