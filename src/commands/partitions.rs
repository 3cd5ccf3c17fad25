//! Partitions command implementation

use super::format_size;
use crate::config::Config;
use partflash_core::partition::{self, PartitionEntry, PartitionTable};

/// Print the partition table, or a single field with `name` and `field`
pub fn run(
    config: &Config,
    name: Option<&str>,
    field: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let table_path = &config.partition_table;

    match (name, field) {
        (Some(name), Some(field)) => {
            println!("{}", partition::lookup(table_path, name, field)?);
        }
        (Some(name), None) => {
            let table = PartitionTable::from_csv_file(table_path)?;
            print_entries(&[table.entry(name)?], config);
        }
        _ => {
            let table = PartitionTable::from_csv_file(table_path)?;
            println!("Partition table: {}", table_path.display());
            let entries = table.entries();
            if entries.len() < table.len() {
                log::warn!(
                    "{} row(s) without a usable offset and size are not shown",
                    table.len() - entries.len()
                );
            }
            print_entries(&entries, config);
        }
    }

    Ok(())
}

/// Print partitions, marking the ones partflash provisions and dumps
fn print_entries(entries: &[PartitionEntry], config: &Config) {
    println!(
        "{:<16} {:>10} {:>10} {:>10} {:>8}",
        "Name", "Offset", "End", "Size", "Role"
    );
    println!("{:-<58}", "");

    for entry in entries {
        let role = if entry.name == config.provision.partition {
            "image"
        } else if entry.name == config.dump.partition {
            "dump"
        } else {
            "-"
        };
        println!(
            "{:<16} {:#010X} {:#010X} {:>10} {:>8}",
            entry.name,
            entry.offset,
            entry.end(),
            format_size(entry.size),
            role
        );
    }
}
