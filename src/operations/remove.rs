//! Removal of managed files from the target tree

use crate::config::RemoveOptions;
use crate::operations::banner::has_banner;
use crate::system::{System, WalkOptions};
use crate::transforms::rules::build_glob_set;
use crate::utils::path::relative_slash;
use anyhow::{Context as _, Result};
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Delete every managed file under `target_root` and prune emptied directories
///
/// Failures on individual files are logged and skipped. Returns the
/// target-relative paths of the files that were removed.
///
/// # Errors
///
/// Returns an error if the ignore globs do not compile or the target tree
/// cannot be walked.
pub fn remove_managed(
    system: &dyn System,
    target_root: &Path,
    options: &RemoveOptions,
) -> Result<Vec<String>> {
    if !system.is_dir(target_root) {
        debug!(
            "Target {} does not exist yet, nothing to remove",
            target_root.display()
        );
        return Ok(Vec::new());
    }

    let ignore = build_glob_set(&options.ignore)?;
    let walk_options = WalkOptions {
        git_ignore: options.gitignore,
        hidden: options.dot,
        ..WalkOptions::default()
    };

    let entries = system
        .walk_dir(target_root, walk_options)
        .with_context(|| format!("Failed to walk target directory: {}", target_root.display()))?;

    let mut removed = Vec::new();
    for entry in entries.iter().filter(|entry| entry.is_file) {
        let Some(relative) = relative_slash(target_root, &entry.path) else {
            continue;
        };
        if ignore.is_match(&relative) {
            debug!("Keeping ignored file {}", relative);
            continue;
        }

        let content = match system.read_to_string(&entry.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                debug!("Skipping non-text file {}", relative);
                continue;
            }
            Err(err) => {
                warn!("✗ Could not read {}: {}", entry.path.display(), err);
                continue;
            }
        };

        if !has_banner(&content) {
            continue;
        }

        if let Err(err) = system.remove_file(&entry.path) {
            warn!("✗ Could not remove {}: {}", entry.path.display(), err);
            continue;
        }
        debug!("Removed managed file {}", relative);

        prune_empty_parents(system, target_root, &entry.path);
        removed.push(relative);
    }

    Ok(removed)
}

/// Remove now-empty ancestors of `file`, stopping at the first non-empty one
/// or at `target_root`
fn prune_empty_parents(system: &dyn System, target_root: &Path, file: &Path) {
    let mut current = file.parent();
    while let Some(dir) = current {
        if dir == target_root || !dir.starts_with(target_root) {
            break;
        }
        if system.remove_dir(dir).is_err() {
            break;
        }
        debug!("Pruned empty directory {}", dir.display());
        current = dir.parent();
    }
}
