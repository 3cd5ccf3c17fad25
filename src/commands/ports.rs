//! Ports command implementation

use crate::config::Config;
use partflash_core::port::{self, PortEnumerator};
use partflash_tools::SystemPorts;

/// List visible serial ports, marking the ones taken as the device
pub fn run(config: &Config, extra_tokens: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let mut tokens = config.port_tokens.clone();
    tokens.extend(extra_tokens.iter().cloned());

    let all = SystemPorts.enumerate()?;
    if all.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    println!("Serial ports (device tokens: {}):", tokens.join(", "));
    let mut first = true;
    for name in &all {
        let marker = if !port::is_candidate(name, &tokens) {
            ""
        } else if first {
            first = false;
            "* (default)"
        } else {
            "*"
        };
        println!("  {:<32} {}", name, marker);
    }

    if first {
        println!("\nNo port matches; is the board plugged in?");
    }
    Ok(())
}
