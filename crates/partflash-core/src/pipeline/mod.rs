//! Orchestration of provisioning and dump runs
//!
//! Each run is a straight line of stages. A stage either completes and the
//! run moves on, or fails and the run stops there with a [`RunFailure`]
//! naming the stage. Nothing is retried: a failed flash write may already
//! have changed the device, so the decision to try again is the operator's.
//!
//! ```text
//! provision: Preconditions -> TableLookup -> CapacityCheck -> ImageGenerated -> Flashed
//! dump:      TableLookup -> PortCheck -> Read -> ArtifactSearch -> Analyzed
//! ```
//!
//! The partition table and the port list are re-read on every run, so edits
//! and hot-plugging between runs are picked up.

mod dump;
mod provision;

#[cfg(test)]
pub(crate) mod testing;

use std::fs;
use std::path::Path;

use crate::error::{Error, RunFailure, Stage, ToolFailure};
use crate::partition::{PartitionEntry, PartitionTable};

pub use dump::{DumpReport, DumpRequest, Dumper};
pub use provision::{ImageSize, ProvisionReport, ProvisionRequest, Provisioner};

/// Callback for stage transitions during a run
pub trait StageObserver {
    /// Called when the run enters `stage`
    fn entered(&mut self, stage: Stage);

    /// Called when `stage` completed successfully
    fn completed(&mut self, stage: Stage);

    /// Called once when the run fails
    fn failed(&mut self, failure: &RunFailure);
}

/// An observer that ignores everything
pub struct NoObserver;

impl StageObserver for NoObserver {
    fn entered(&mut self, _stage: Stage) {}
    fn completed(&mut self, _stage: Stage) {}
    fn failed(&mut self, _failure: &RunFailure) {}
}

/// Run one stage, reporting the transition and wrapping any error
fn step<T>(
    observer: &mut dyn StageObserver,
    stage: Stage,
    f: impl FnOnce() -> Result<T, Error>,
) -> Result<T, RunFailure> {
    log::debug!("Entering stage: {}", stage);
    observer.entered(stage);
    match f() {
        Ok(value) => {
            observer.completed(stage);
            Ok(value)
        }
        Err(error) => {
            let failure = RunFailure::new(stage, error);
            log::debug!("{}", failure);
            observer.failed(&failure);
            Err(failure)
        }
    }
}

/// Resolve a partition from a freshly read table
fn lookup_partition(table: &Path, name: &str) -> Result<PartitionEntry, Error> {
    let entry = PartitionTable::from_csv_file(table)
        .and_then(|t| t.entry(name))
        .map_err(|e| Error::Configuration(format!("missing partition fields: {}", e)))?;
    log::info!(
        "Partition '{}': offset {} size {}",
        entry.name,
        entry.offset_hex(),
        entry.size_hex()
    );
    Ok(entry)
}

/// Remove a previous run's output so it cannot be mistaken for this run's
fn discard_stale(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::Validation(format!(
            "cannot remove stale {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Size of the file a tool claimed to produce
fn produced_len(tool: &str, path: &Path) -> Result<u64, Error> {
    fs::metadata(path).map(|m| m.len()).map_err(|_| {
        ToolFailure::new(
            tool,
            format!("reported success but {} was not created", path.display()),
        )
        .into()
    })
}
