//! Debug artifact lookup
//!
//! A coredump is only readable next to the ELF it was produced by. The build
//! tree usually holds exactly one; when there are several, the first in path
//! order wins so repeated runs pick the same binary.

use std::path::{Path, PathBuf};

use crate::walk;

/// File extension of binaries that keep their symbols
pub const DEBUG_EXTENSION: &str = "elf";

/// A candidate debug binary
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DebugArtifact {
    /// Location of the binary
    pub path: PathBuf,
}

/// Find every file under `build_root` ending in `.{extension}`, sorted by path
///
/// A build root that is missing or unreadable yields no candidates; callers
/// report that the same way as an empty tree.
pub fn find_debug_artifacts(build_root: &Path, extension: &str) -> Vec<DebugArtifact> {
    match walk::files_with_extension(build_root, extension) {
        Ok(paths) => paths
            .into_iter()
            .map(|path| DebugArtifact { path })
            .collect(),
        Err(e) => {
            log::warn!("Cannot search {}: {}", build_root.display(), e);
            Vec::new()
        }
    }
}

/// First candidate under `build_root`, if any
pub fn select_debug_artifact(build_root: &Path, extension: &str) -> Option<DebugArtifact> {
    let candidates = find_debug_artifacts(build_root, extension);
    if candidates.len() > 1 {
        log::info!(
            "Found {} debug binaries, using {}",
            candidates.len(),
            candidates[0].path.display()
        );
        for other in &candidates[1..] {
            log::debug!("  ignored {}", other.path.display());
        }
    }
    candidates.into_iter().next()
}
