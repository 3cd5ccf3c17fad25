//! CLI command implementations
//!
//! `provision` and `dump` build a request from the configuration, wire the
//! process-backed tools into the orchestrators from partflash-core and print
//! a summary. `partitions` and `ports` are read-only helpers for checking a
//! setup before touching the device.

pub mod dump;
pub mod partitions;
pub mod ports;
mod progress;
pub mod provision;

use crate::config::Config;
use partflash_core::port;
use partflash_tools::{SystemPorts, ToolRunner};
use std::time::Duration;

/// Format a byte count for display
fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}

/// Tool runner honoring the configured timeout
fn tool_runner(config: &Config) -> ToolRunner {
    ToolRunner::with_timeout(config.tool_timeout_secs.map(Duration::from_secs))
}

/// First device port for commands that need one but weren't given one
///
/// Returns an empty string when nothing matches, which the provisioning
/// preconditions reject.
fn default_port(config: &Config) -> String {
    match port::list_candidate_ports(&SystemPorts, &config.port_tokens) {
        Ok(ports) => match ports.into_iter().next() {
            Some(p) => {
                log::info!("Using port {}", p.identifier);
                p.identifier
            }
            None => {
                log::warn!("No device port found, pass one with --port");
                String::new()
            }
        },
        Err(e) => {
            log::warn!("Cannot enumerate serial ports: {}", e);
            String::new()
        }
    }
}
