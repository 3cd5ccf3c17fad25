//! Directory tree traversal
//!
//! One recursive walker, parameterized by a file predicate and an
//! accumulator. Size computation and artifact search are both folds over it.
//!
//! Entries are visited in lexicographic order of their names at every level,
//! so a walk over an unchanged tree always yields the same sequence.
//! Symlinked directories are not descended into.

use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Fold over every regular file under `root` that matches `predicate`
pub fn fold_files<T, P, F>(root: &Path, predicate: P, init: T, mut f: F) -> io::Result<T>
where
    P: Fn(&Path) -> bool,
    F: FnMut(T, &Path, &Metadata) -> T,
{
    let mut acc = init;
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }

        // Follows symlinks, so a link to a regular file counts as that file
        let path = entry.path();
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("Skipping {}: {}", path.display(), e);
                continue;
            }
        };
        if metadata.is_file() && predicate(path) {
            acc = f(acc, path, &metadata);
        }
    }
    Ok(acc)
}

/// Total size in bytes of every regular file under `root`
pub fn tree_size(root: &Path) -> io::Result<u64> {
    fold_files(root, |_| true, 0u64, |total, _, meta| {
        total.saturating_add(meta.len())
    })
}

/// Every regular file under `root` whose name ends with `.{extension}`,
/// sorted by path
pub fn files_with_extension(root: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let suffix = format!(".{}", extension);
    let mut found = fold_files(
        root,
        |path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&suffix))
        },
        Vec::new(),
        |mut acc, path, _| {
            acc.push(path.to_path_buf());
            acc
        },
    )?;
    found.sort();
    Ok(found)
}
