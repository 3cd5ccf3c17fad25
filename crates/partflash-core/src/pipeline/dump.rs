//! Coredump retrieval and analysis

use std::path::PathBuf;

use super::{discard_stale, lookup_partition, produced_len, step, StageObserver};
use crate::artifact::{self, DebugArtifact};
use crate::error::{Error, RunFailure, Stage};
use crate::partition::PartitionEntry;
use crate::port::{self, DevicePort, PortEnumerator};
use crate::tools::{DumpAnalyzer, FlashReader, ReadRequest, COREDUMP_FORMAT};

/// Everything a dump run needs, passed in explicitly
#[derive(Debug, Clone)]
pub struct DumpRequest {
    /// Partition table to read
    pub table: PathBuf,
    /// Name of the coredump partition
    pub partition: String,
    /// Port to use instead of enumerating
    pub port: Option<String>,
    /// Substrings identifying device ports during enumeration
    pub port_tokens: Vec<String>,
    /// Serial baud rate
    pub baud: u32,
    /// Where the raw dump is written
    pub output_dump: PathBuf,
    /// Build tree searched for the debug binary
    pub build_dir: PathBuf,
    /// Debug binary to use instead of searching
    pub elf: Option<PathBuf>,
    /// Extension of debug binaries
    pub debug_extension: String,
}

/// Result of a successful dump run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    /// Partition that was read
    pub partition: PartitionEntry,
    /// Port the dump was read through
    pub port: DevicePort,
    /// Raw dump file
    pub dump: PathBuf,
    /// Debug binary used for analysis
    pub artifact: DebugArtifact,
    /// Analyzer output
    pub report: String,
}

/// Sequences coredump read-out and analysis
pub struct Dumper<'a> {
    ports: &'a dyn PortEnumerator,
    reader: &'a dyn FlashReader,
    analyzer: &'a dyn DumpAnalyzer,
}

impl<'a> Dumper<'a> {
    /// Create a dumper over the given collaborators
    pub fn new(
        ports: &'a dyn PortEnumerator,
        reader: &'a dyn FlashReader,
        analyzer: &'a dyn DumpAnalyzer,
    ) -> Self {
        Self {
            ports,
            reader,
            analyzer,
        }
    }

    /// Run table lookup, port check, flash read, artifact search and analysis
    pub fn run(
        &self,
        req: &DumpRequest,
        observer: &mut dyn StageObserver,
    ) -> Result<DumpReport, RunFailure> {
        let partition = step(observer, Stage::TableLookup, || {
            lookup_partition(&req.table, &req.partition)
        })?;

        let port = step(observer, Stage::PortCheck, || self.select_port(req))?;

        step(observer, Stage::Read, || {
            discard_stale(&req.output_dump)?;
            let request = ReadRequest {
                port: port.identifier.clone(),
                baud: req.baud,
                offset_hex: partition.offset_hex(),
                size_hex: partition.size_hex(),
                output: req.output_dump.clone(),
            };
            self.reader.read(&request)?;

            let len = produced_len("flash reader", &req.output_dump)?;
            if len != partition.size {
                log::warn!(
                    "Read {} bytes from a {} byte partition",
                    len,
                    partition.size
                );
            }
            Ok(())
        })?;

        let artifact = step(observer, Stage::ArtifactSearch, || match &req.elf {
            Some(path) if path.is_file() => Ok(DebugArtifact { path: path.clone() }),
            Some(path) => Err(Error::ArtifactNotFound(format!(
                "debug binary {} does not exist",
                path.display()
            ))),
            None => artifact::select_debug_artifact(&req.build_dir, &req.debug_extension)
                .ok_or_else(|| {
                    Error::ArtifactNotFound(format!(
                        "no debug binary found under {}",
                        req.build_dir.display()
                    ))
                }),
        })?;

        let report = step(observer, Stage::Analyzed, || {
            Ok(self
                .analyzer
                .analyze(&req.output_dump, &artifact.path, COREDUMP_FORMAT)?)
        })?;

        Ok(DumpReport {
            partition,
            port,
            dump: req.output_dump.clone(),
            artifact,
            report,
        })
    }

    fn select_port(&self, req: &DumpRequest) -> Result<DevicePort, Error> {
        if let Some(identifier) = &req.port {
            if identifier.trim().is_empty() {
                return Err(Error::Validation("empty port name".into()));
            }
            return Ok(DevicePort {
                identifier: identifier.clone(),
            });
        }

        let candidates = port::list_candidate_ports(self.ports, &req.port_tokens)
            .map_err(|e| Error::DeviceUnavailable(format!("cannot enumerate ports: {}", e)))?;

        let count = candidates.len();
        let first = candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::DeviceUnavailable("no device attached".into()))?;
        if count > 1 {
            log::info!("{} devices found, using {}", count, first.identifier);
        } else {
            log::info!("Using {}", first.identifier);
        }
        Ok(first)
    }
}
