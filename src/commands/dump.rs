//! Dump command implementation

use super::progress::StageProgress;
use super::tool_runner;
use crate::config::Config;
use partflash_core::pipeline::{DumpRequest, Dumper};
use partflash_tools::{EspCoredump, Esptool, SystemPorts};
use std::fs;
use std::path::Path;

/// Read the coredump partition, analyze it and print the report
pub fn run(
    config: &Config,
    port: Option<&str>,
    elf: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = tool_runner(config);
    let reader = Esptool::new(config.tools.esptool()?, runner);
    let analyzer = EspCoredump::new(config.tools.espcoredump()?, runner);

    let request = build_request(config, port, elf);
    let mut progress = StageProgress::new();
    let report = Dumper::new(&SystemPorts, &reader, &analyzer).run(&request, &mut progress)?;

    println!(
        "Read {} ({} bytes at {}) from {}",
        report.dump.display(),
        report.partition.size,
        report.partition.offset_hex(),
        report.port.identifier
    );
    println!("Symbols from {}\n", report.artifact.path.display());
    println!("{}", report.report.trim_end());

    if let Some(path) = &config.dump.report {
        fs::write(path, &report.report)?;
        println!("\nSaved report to {}", path.display());
    }

    Ok(())
}

fn build_request(config: &Config, port: Option<&str>, elf: Option<&Path>) -> DumpRequest {
    DumpRequest {
        table: config.partition_table.clone(),
        partition: config.dump.partition.clone(),
        port: port.map(str::to_string),
        port_tokens: config.port_tokens.clone(),
        baud: config.baud,
        output_dump: config.dump.output.clone(),
        build_dir: config.dump.build_dir.clone(),
        elf: elf.map(Path::to_path_buf),
        debug_extension: config.dump.debug_extension.clone(),
    }
}
