//! Filesystem image provisioning

use std::path::PathBuf;
use std::str::FromStr;

use super::{discard_stale, lookup_partition, produced_len, step, StageObserver};
use crate::capacity::{self, CapacityPlan};
use crate::error::{Error, RunFailure, Stage};
use crate::partition::PartitionEntry;
use crate::tools::{FlashWriter, ImagePackager, WriteRequest};
use crate::walk;

/// Size handed to the image packager
///
/// The capacity decision always uses the aligned source size. The image
/// itself defaults to the whole partition: SPIFFS spends part of every block
/// on lookup pages and page headers, so an image sized to the raw content
/// runs out of room, and a short image leaves stale pages past its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageSize {
    /// The source size rounded up to the block size
    Aligned,
    /// The whole partition
    #[default]
    Partition,
}

impl ImageSize {
    /// Target image size for `plan`
    pub fn target(&self, plan: &CapacityPlan) -> u64 {
        match self {
            Self::Aligned => plan.aligned_size,
            Self::Partition => plan.partition_size,
        }
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aligned" => Ok(Self::Aligned),
            "partition" => Ok(Self::Partition),
            other => Err(format!(
                "invalid image size '{}' (expected 'aligned' or 'partition')",
                other
            )),
        }
    }
}

/// Everything a provisioning run needs, passed in explicitly
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    /// Partition table to read
    pub table: PathBuf,
    /// Name of the filesystem partition
    pub partition: String,
    /// Serial port of the device
    pub port: String,
    /// Directory whose contents become the image
    pub source_dir: PathBuf,
    /// Where the image is generated
    pub output_image: PathBuf,
    /// Chip identifier for the flash writer
    pub chip: String,
    /// Serial baud rate
    pub baud: u32,
    /// Flash block size for alignment
    pub block_size: u64,
    /// Size handed to the packager
    pub image_size: ImageSize,
    /// Accept a source directory with no bytes in it
    pub allow_empty: bool,
    /// Stop after the capacity check
    pub dry_run: bool,
}

/// Result of a successful provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Partition that was targeted
    pub partition: PartitionEntry,
    /// Capacity plan the run was based on
    pub plan: CapacityPlan,
    /// Generated image, `None` on a dry run
    pub image: Option<PathBuf>,
}

/// Sequences image generation and flashing for one partition
pub struct Provisioner<'a> {
    packager: &'a dyn ImagePackager,
    writer: &'a dyn FlashWriter,
}

impl<'a> Provisioner<'a> {
    /// Create a provisioner over the given collaborators
    pub fn new(packager: &'a dyn ImagePackager, writer: &'a dyn FlashWriter) -> Self {
        Self { packager, writer }
    }

    /// Run table lookup, capacity check, image generation and flash write
    pub fn run(
        &self,
        req: &ProvisionRequest,
        observer: &mut dyn StageObserver,
    ) -> Result<ProvisionReport, RunFailure> {
        step(observer, Stage::Preconditions, || {
            if !req.dry_run && req.port.trim().is_empty() {
                return Err(Error::Validation("no port selected".into()));
            }
            if req.block_size == 0 {
                return Err(Error::Validation("block size must be greater than zero".into()));
            }
            if req.source_dir.as_os_str().is_empty() {
                return Err(Error::Validation("no source directory selected".into()));
            }
            if !req.source_dir.is_dir() {
                return Err(Error::Validation(format!(
                    "source directory {} does not exist",
                    req.source_dir.display()
                )));
            }
            Ok(())
        })?;

        let partition = step(observer, Stage::TableLookup, || {
            lookup_partition(&req.table, &req.partition)
        })?;

        let plan = step(observer, Stage::CapacityCheck, || {
            let raw = walk::tree_size(&req.source_dir).map_err(|e| {
                Error::Validation(format!(
                    "cannot measure {}: {}",
                    req.source_dir.display(),
                    e
                ))
            })?;
            if raw == 0 && !req.allow_empty {
                return Err(Error::Validation(format!(
                    "source directory {} is empty",
                    req.source_dir.display()
                )));
            }

            let plan = capacity::plan(raw, partition.size, req.block_size);
            log::info!(
                "Source {} bytes, aligned {} bytes, partition {} bytes",
                plan.raw_size,
                plan.aligned_size,
                plan.partition_size
            );
            if !plan.fits {
                return Err(Error::Validation(format!(
                    "source exceeds partition size ({} > {} bytes)",
                    plan.aligned_size, plan.partition_size
                )));
            }
            Ok(plan)
        })?;

        if req.dry_run {
            log::info!("Dry run, not generating or flashing");
            return Ok(ProvisionReport {
                partition,
                plan,
                image: None,
            });
        }

        step(observer, Stage::ImageGenerated, || {
            discard_stale(&req.output_image)?;
            let target = req.image_size.target(&plan);
            self.packager
                .package(target, &req.source_dir, &req.output_image)?;

            let len = produced_len("image packager", &req.output_image)?;
            if len > partition.size {
                return Err(Error::Validation(format!(
                    "generated image is {} bytes, partition holds {}",
                    len, partition.size
                )));
            }
            Ok(())
        })?;

        step(observer, Stage::Flashed, || {
            let request = WriteRequest {
                chip: req.chip.clone(),
                port: req.port.clone(),
                baud: req.baud,
                offset_hex: partition.offset_hex(),
                image: req.output_image.clone(),
            };
            self.writer.write(&request)?;
            Ok(())
        })?;

        Ok(ProvisionReport {
            partition,
            plan,
            image: Some(req.output_image.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::DEFAULT_BLOCK_SIZE;
    use crate::pipeline::testing::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        log: CallLog,
    }

    impl Fixture {
        fn new(source_bytes: usize) -> Self {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("partitions.csv"), TABLE).unwrap();
            let source = dir.path().join("spiffs");
            fs::create_dir_all(source.join("img")).unwrap();
            if source_bytes > 0 {
                let half = source_bytes / 2;
                fs::write(source.join("main.js"), vec![b'x'; half]).unwrap();
                fs::write(source.join("img/bg.png"), vec![0u8; source_bytes - half]).unwrap();
            }
            Self {
                dir,
                log: CallLog::default(),
            }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.dir.path().join(rel)
        }

        fn request(&self) -> ProvisionRequest {
            ProvisionRequest {
                table: self.path("partitions.csv"),
                partition: "spiffs".into(),
                port: "/dev/ttyUSB0".into(),
                source_dir: self.path("spiffs"),
                output_image: self.path("spiffs_image.bin"),
                chip: "esp32s3".into(),
                baud: 115200,
                block_size: DEFAULT_BLOCK_SIZE,
                image_size: ImageSize::default(),
                allow_empty: false,
                dry_run: false,
            }
        }

        fn run(
            &self,
            req: &ProvisionRequest,
            packager: &FakePackager<'_>,
            writer: &FakeWriter<'_>,
        ) -> (Result<ProvisionReport, RunFailure>, RecordingObserver) {
            let mut observer = RecordingObserver::default();
            let result = Provisioner::new(packager, writer).run(req, &mut observer);
            (result, observer)
        }

        fn packager(&self, produce: Option<u64>) -> FakePackager<'_> {
            FakePackager {
                log: &self.log,
                fail: None,
                produce,
            }
        }

        fn writer(&self) -> FakeWriter<'_> {
            FakeWriter {
                log: &self.log,
                fail: None,
            }
        }
    }

    fn assert_failed(result: &Result<ProvisionReport, RunFailure>, stage: Stage) -> &Error {
        match result {
            Err(failure) => {
                assert_eq!(failure.stage, stage, "unexpected failure {}", failure);
                &failure.error
            }
            Ok(report) => panic!("expected failure at {}, got {:?}", stage, report),
        }
    }

    #[test]
    fn test_fitting_source_is_packaged_and_flashed() {
        let fx = Fixture::new(1_000_000);
        let req = fx.request();
        let (result, observer) = fx.run(&req, &fx.packager(Some(1_003_520)), &fx.writer());

        let report = result.unwrap();
        assert_eq!(report.plan.raw_size, 1_000_000);
        assert_eq!(report.plan.aligned_size, 1_003_520);
        assert!(report.plan.fits);
        assert_eq!(report.image.as_deref(), Some(req.output_image.as_path()));
        assert_eq!(
            fx.log.calls(),
            vec![
                format!("package 1048576 {}", req.source_dir.display()),
                "write esp32s3 /dev/ttyUSB0 115200 0x310000".to_string(),
            ]
        );
        assert_eq!(
            observer.completed,
            vec![
                Stage::Preconditions,
                Stage::TableLookup,
                Stage::CapacityCheck,
                Stage::ImageGenerated,
                Stage::Flashed,
            ]
        );
        assert!(observer.failed.is_none());
    }

    #[test]
    fn test_oversized_source_never_reaches_the_device() {
        let fx = Fixture::new(1_100_000);
        let (result, observer) = fx.run(&fx.request(), &fx.packager(Some(1)), &fx.writer());

        let error = assert_failed(&result, Stage::CapacityCheck);
        assert!(matches!(error, Error::Validation(m) if m.starts_with("source exceeds partition size")));
        assert!(fx.log.calls().is_empty());
        assert!(!fx.path("spiffs_image.bin").exists());
        assert_eq!(observer.failed.unwrap().stage, Stage::CapacityCheck);
    }

    #[test]
    fn test_aligned_image_size_option() {
        let fx = Fixture::new(10);
        let mut req = fx.request();
        req.image_size = ImageSize::Aligned;
        let (result, _) = fx.run(&req, &fx.packager(Some(4096)), &fx.writer());

        result.unwrap();
        assert!(fx.log.contains("package 4096 "));
    }

    #[test]
    fn test_default_image_fills_partition() {
        let fx = Fixture::new(1_000_000);
        let req = fx.request();
        assert_eq!(req.image_size, ImageSize::Partition);
        let (result, _) = fx.run(&req, &fx.packager(Some(0x100000)), &fx.writer());

        let report = result.unwrap();
        assert_eq!(report.plan.aligned_size, 1_003_520);
        assert!(fx.log.contains("package 1048576 "));
    }

    #[test]
    fn test_zero_block_size_is_rejected_not_panicking() {
        let fx = Fixture::new(10);
        let mut req = fx.request();
        req.block_size = 0;
        let (result, _) = fx.run(&req, &fx.packager(Some(1)), &fx.writer());

        let error = assert_failed(&result, Stage::Preconditions);
        assert!(matches!(error, Error::Validation(m) if m.contains("block size")));
        assert!(fx.log.calls().is_empty());
    }

    #[test]
    fn test_preconditions_checked_before_lookup() {
        let fx = Fixture::new(10);

        let mut no_port = fx.request();
        no_port.port = String::new();
        no_port.table = fx.path("does-not-exist.csv");
        let (result, observer) = fx.run(&no_port, &fx.packager(Some(1)), &fx.writer());
        assert_failed(&result, Stage::Preconditions);
        assert_eq!(observer.entered, vec![Stage::Preconditions]);

        let mut no_dir = fx.request();
        no_dir.source_dir = PathBuf::new();
        let (result, _) = fx.run(&no_dir, &fx.packager(Some(1)), &fx.writer());
        assert_failed(&result, Stage::Preconditions);

        let mut missing_dir = fx.request();
        missing_dir.source_dir = fx.path("nowhere");
        let (result, _) = fx.run(&missing_dir, &fx.packager(Some(1)), &fx.writer());
        assert_failed(&result, Stage::Preconditions);

        assert!(fx.log.calls().is_empty());
    }

    #[test]
    fn test_missing_partition_is_configuration_error() {
        let fx = Fixture::new(10);
        let mut req = fx.request();
        req.partition = "storage".into();
        let (result, _) = fx.run(&req, &fx.packager(Some(1)), &fx.writer());

        let error = assert_failed(&result, Stage::TableLookup);
        assert!(matches!(error, Error::Configuration(m) if m.contains("missing partition fields")));
        assert!(fx.log.calls().is_empty());
    }

    #[test]
    fn test_empty_source_policy() {
        let fx = Fixture::new(0);
        let (result, _) = fx.run(&fx.request(), &fx.packager(Some(0)), &fx.writer());
        let error = assert_failed(&result, Stage::CapacityCheck);
        assert!(matches!(error, Error::Validation(m) if m.contains("is empty")));

        let mut req = fx.request();
        req.allow_empty = true;
        let (result, _) = fx.run(&req, &fx.packager(Some(0)), &fx.writer());
        assert_eq!(result.unwrap().plan.aligned_size, 0);
        assert!(fx.log.contains("package 1048576 "));
    }

    #[test]
    fn test_packager_failure_is_verbatim_and_stops_run() {
        let fx = Fixture::new(10);
        let packager = FakePackager {
            log: &fx.log,
            fail: Some("spiffsgen: object name too long"),
            produce: None,
        };
        let (result, _) = fx.run(&fx.request(), &packager, &fx.writer());

        let error = assert_failed(&result, Stage::ImageGenerated);
        assert_eq!(error.to_string(), "spiffsgen failed: spiffsgen: object name too long");
        assert!(!fx.log.contains("write"));
    }

    #[test]
    fn test_stale_image_is_not_reused() {
        let fx = Fixture::new(10);
        fs::write(fx.path("spiffs_image.bin"), b"old image").unwrap();

        let (result, _) = fx.run(&fx.request(), &fx.packager(None), &fx.writer());
        let error = assert_failed(&result, Stage::ImageGenerated);
        assert!(matches!(error, Error::ExternalTool(f) if f.message.contains("was not created")));
        assert!(!fx.path("spiffs_image.bin").exists());
        assert!(!fx.log.contains("write"));
    }

    #[test]
    fn test_oversized_generated_image_is_not_flashed() {
        let fx = Fixture::new(10);
        let (result, _) = fx.run(&fx.request(), &fx.packager(Some(0x100001)), &fx.writer());
        assert_failed(&result, Stage::ImageGenerated);
        assert!(!fx.log.contains("write"));
    }

    #[test]
    fn test_writer_failure_is_not_retried() {
        let fx = Fixture::new(10);
        let writer = FakeWriter {
            log: &fx.log,
            fail: Some("Failed to connect to ESP32-S3: No serial data received."),
        };
        let (result, observer) = fx.run(&fx.request(), &fx.packager(Some(4096)), &writer);

        let error = assert_failed(&result, Stage::Flashed);
        assert!(error.to_string().contains("No serial data received"));
        assert_eq!(
            fx.log.calls().iter().filter(|c| c.starts_with("write")).count(),
            1
        );
        assert_eq!(observer.entered.last(), Some(&Stage::Flashed));
    }

    #[test]
    fn test_dry_run_stops_after_capacity_check() {
        let fx = Fixture::new(5000);
        let mut req = fx.request();
        req.dry_run = true;
        req.port = String::new();
        let (result, observer) = fx.run(&req, &fx.packager(Some(8192)), &fx.writer());

        let report = result.unwrap();
        assert_eq!(report.image, None);
        assert_eq!(report.plan.aligned_size, 8192);
        assert!(fx.log.calls().is_empty());
        assert_eq!(observer.completed.last(), Some(&Stage::CapacityCheck));
    }

    #[test]
    fn test_table_is_reread_each_run() {
        let fx = Fixture::new(10);
        let req = fx.request();
        fx.run(&req, &fx.packager(Some(4096)), &fx.writer()).0.unwrap();

        fs::write(&req.table, TABLE.replace("0x310000", "0x320000")).unwrap();
        fx.run(&req, &fx.packager(Some(4096)), &fx.writer()).0.unwrap();

        assert!(fx.log.contains("write esp32s3 /dev/ttyUSB0 115200 0x310000"));
        assert!(fx.log.contains("write esp32s3 /dev/ttyUSB0 115200 0x320000"));
    }

    #[test]
    fn test_image_size_from_str() {
        assert_eq!("aligned".parse::<ImageSize>(), Ok(ImageSize::Aligned));
        assert_eq!("partition".parse::<ImageSize>(), Ok(ImageSize::Partition));
        assert!("full".parse::<ImageSize>().is_err());
    }
}
