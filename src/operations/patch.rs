//! Patches capturing manual edits to vendored files
//!
//! A patch is a unified diff between the freshly transformed file and the
//! edited file in the target tree. Patches are stored flat in the patch
//! folder and re-applied with `git apply` after every regeneration.

use crate::config::Config;
use crate::error::VendorError;
use crate::system::System;
use crate::transforms::{Pipeline, TransformLoader};
use crate::utils::fs::write_file;
use crate::utils::path::{join_slash, normalize_path, validate_relative_path};
use anyhow::{Context as _, Result};
use similar::TextDiff;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Suffix of stored patch files
pub const PATCH_SUFFIX: &str = ".vendorism.patch";

/// Flat file name of the patch for a target-relative path
#[must_use]
pub fn patch_file_name(relative: &str) -> String {
    format!("{}{PATCH_SUFFIX}", relative.trim_start_matches('/').replace('/', "__"))
}

/// Render a unified diff between two versions of `relative`
///
/// Returns `None` when both versions are identical.
#[must_use]
pub fn unified_diff(relative: &str, original: &str, edited: &str) -> Option<String> {
    if original == edited {
        return None;
    }

    let diff = TextDiff::from_lines(original, edited);
    let rendered = diff
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{relative}"), &format!("b/{relative}"))
        .to_string();

    Some(rendered)
}

/// Record manual edits of a vendored file as a patch
///
/// `relative_path` is relative to the source root. The pipeline runs on the
/// source file and its output is diffed against the file currently in the
/// target tree. Returns the written patch path, or `None` when the file has
/// no manual edits (any stale patch is removed).
///
/// # Errors
///
/// Returns a patch error if no patch folder is configured, no target path is
/// set, or the target file does not exist.
pub fn create_diff(
    system: &dyn System,
    config: &Config,
    relative_path: &str,
) -> Result<Option<PathBuf>> {
    let patch_folder = config.target.patch_folder.as_deref().ok_or_else(|| {
        VendorError::patch("Patch folder not defined in configuration (target.patchFolder)")
    })?;
    let target_root = config
        .target_root()
        .ok_or_else(|| VendorError::patch("Target path not defined in configuration"))?;

    let relative_path = relative_path.trim_start_matches("./");
    validate_relative_path(relative_path)?;

    let source_file = join_slash(&config.source_root(), relative_path);
    let source_content = system
        .read_to_string(&source_file)
        .map_err(|err| {
            VendorError::filesystem(format!(
                "Failed to read source file {}: {err}",
                source_file.display()
            ))
        })?;

    let mut loader = TransformLoader::new(system);
    let pipeline = Pipeline::from_target(&config.target, &mut loader, config.banner())?;
    let processed = pipeline.apply(relative_path, &source_content)?;

    let target_file = join_slash(&target_root, &processed.path);
    if !system.is_file(&target_file) {
        return Err(VendorError::patch(format!(
            "File to be patched not found: {}",
            target_file.display()
        ))
        .into());
    }

    let edited = system
        .read_to_string(&target_file)
        .with_context(|| format!("Failed to read {}", target_file.display()))?;

    let patch_path = Path::new(patch_folder).join(patch_file_name(&processed.path));

    let Some(diff) = unified_diff(&processed.path, &processed.content, &edited) else {
        if system.is_file(&patch_path) {
            system
                .remove_file(&patch_path)
                .with_context(|| format!("Failed to remove stale patch {}", patch_path.display()))?;
            info!("✓ No changes left, removed stale patch {}", patch_path.display());
        } else {
            info!("✓ No changes to record for {}", processed.path);
        }
        return Ok(None);
    };

    write_file(system, &patch_path, &diff)?;
    info!("✓ Patch created: {}", patch_path.display());

    Ok(Some(patch_path))
}

/// Apply the stored patch for a freshly written file, if one exists
///
/// Returns whether a patch was applied. Failures are logged and leave the
/// unpatched file in place.
///
/// # Errors
///
/// Returns an error only if the working directory cannot be determined.
pub fn apply_patch(system: &dyn System, config: &Config, relative_path: &str) -> Result<bool> {
    let (Some(patch_folder), Some(target_root)) =
        (config.target.patch_folder.as_deref(), config.target_root())
    else {
        return Ok(false);
    };

    let patch_path = Path::new(patch_folder).join(patch_file_name(relative_path));
    if !system.is_file(&patch_path) {
        return Ok(false);
    }

    let cwd = system
        .current_dir()
        .context("Failed to determine the current directory")?;
    let absolute_patch = normalize_path(&cwd.join(&patch_path));
    let absolute_target = normalize_path(&cwd.join(&target_root));

    debug!("Applying patch {}", absolute_patch.display());
    match run_git_apply(&absolute_patch, &absolute_target) {
        Ok(()) => {
            info!("✓ Patch applied: {}", patch_path.display());
            Ok(true)
        }
        Err(err) => {
            warn!("✗ Failed to apply patch {}: {:#}", patch_path.display(), err);
            Ok(false)
        }
    }
}

/// Run `git apply` with the target root as the repository boundary
fn run_git_apply(patch: &Path, target_root: &Path) -> Result<()> {
    let mut command = Command::new("git");
    command
        .args(["apply", "--whitespace=fix"])
        .arg(patch)
        .current_dir(target_root);

    // Keep git from resolving paths against an enclosing repository
    if let Some(parent) = target_root.parent() {
        command.env("GIT_CEILING_DIRECTORIES", parent);
    }

    let output = command
        .output()
        .context("Failed to execute git apply command")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VendorError::patch(format!(
            "git apply exited with code {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        ))
        .into());
    }

    Ok(())
}
