//! Device port resolution
//!
//! Ports are enumerated fresh on every call: boards get plugged and
//! unplugged between runs, so nothing here is cached.

use std::io;

/// Substring that marks a serial port as a USB bridge to the device
pub const DEFAULT_DEVICE_TOKEN: &str = "usb";

/// A serial port that may lead to the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePort {
    /// OS identifier (`/dev/ttyUSB0`, `COM3`, ...)
    pub identifier: String,
}

/// Source of the host's current serial port names
pub trait PortEnumerator {
    /// All serial ports visible right now, in OS enumeration order
    fn enumerate(&self) -> io::Result<Vec<String>>;
}

impl<F> PortEnumerator for F
where
    F: Fn() -> io::Result<Vec<String>>,
{
    fn enumerate(&self) -> io::Result<Vec<String>> {
        self()
    }
}

/// Check whether a port identifier contains any of `tokens`, ignoring case
///
/// Blank tokens never match.
pub fn is_candidate(identifier: &str, tokens: &[String]) -> bool {
    let identifier = identifier.to_lowercase();
    tokens
        .iter()
        .map(|token| token.trim())
        .filter(|token| !token.is_empty())
        .any(|token| identifier.contains(&token.to_lowercase()))
}

/// Enumerate ports and keep those recognized as the device
///
/// An empty result means no device is attached; it is not an error.
pub fn list_candidate_ports(
    enumerator: &dyn PortEnumerator,
    tokens: &[String],
) -> io::Result<Vec<DevicePort>> {
    let all = enumerator.enumerate()?;
    log::debug!("Visible serial ports: {:?}", all);

    Ok(all
        .into_iter()
        .filter(|id| is_candidate(id, tokens))
        .map(|identifier| DevicePort { identifier })
        .collect())
}
