//! Provision command implementation

use super::progress::StageProgress;
use super::{default_port, format_size, tool_runner};
use crate::config::Config;
use partflash_core::pipeline::{ProvisionReport, ProvisionRequest, Provisioner};
use partflash_tools::{Esptool, Spiffsgen};

/// Package the configured source directory and flash it
pub fn run(
    config: &Config,
    port: Option<&str>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = tool_runner(config);
    let packager = Spiffsgen::new(config.tools.spiffsgen()?, runner);
    let writer = Esptool::new(config.tools.esptool()?, runner);

    let port = match port {
        Some(p) => p.to_string(),
        None if dry_run => String::new(),
        None => default_port(config),
    };

    let request = build_request(config, port, dry_run);
    let mut progress = StageProgress::new();
    let report = Provisioner::new(&packager, &writer).run(&request, &mut progress)?;

    print_report(&report, &request);
    Ok(())
}

fn build_request(config: &Config, port: String, dry_run: bool) -> ProvisionRequest {
    ProvisionRequest {
        table: config.partition_table.clone(),
        partition: config.provision.partition.clone(),
        port,
        source_dir: config.provision.source_dir.clone(),
        output_image: config.provision.image.clone(),
        chip: config.chip.clone(),
        baud: config.baud,
        block_size: config.provision.block_size,
        image_size: config.provision.image_size,
        allow_empty: config.provision.allow_empty_image,
        dry_run,
    }
}

fn print_report(report: &ProvisionReport, request: &ProvisionRequest) {
    let plan = &report.plan;
    println!(
        "Partition {}: offset {}, size {} ({})",
        report.partition.name,
        report.partition.offset_hex(),
        report.partition.size_hex(),
        format_size(report.partition.size)
    );
    println!(
        "Source:    {} bytes, {} bytes block-aligned, {} bytes to spare",
        plan.raw_size,
        plan.aligned_size,
        plan.headroom()
    );

    match &report.image {
        Some(image) => println!(
            "Flashed {} to {} at {}",
            image.display(),
            request.port,
            report.partition.offset_hex()
        ),
        None => println!("Dry run: source fits, nothing generated or flashed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partflash_core::pipeline::ImageSize;
    use std::path::PathBuf;

    #[test]
    fn test_request_follows_config() {
        let mut config = Config::default();
        config.chip = "esp32".into();
        config.baud = 460800;
        config.provision.partition = "storage".into();
        config.provision.image_size = ImageSize::Aligned;

        let request = build_request(&config, "/dev/ttyUSB0".into(), false);
        assert_eq!(request.partition, "storage");
        assert_eq!(request.port, "/dev/ttyUSB0");
        assert_eq!(request.chip, "esp32");
        assert_eq!(request.baud, 460800);
        assert_eq!(request.table, PathBuf::from("partitions.csv"));
        assert_eq!(request.block_size, 4096);
        assert_eq!(request.image_size, ImageSize::Aligned);
        assert!(!request.allow_empty);
        assert!(!request.dry_run);
    }
}
