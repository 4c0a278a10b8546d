//! Sync engine: regenerate the managed part of the target tree
//!
//! A sync removes every managed file, then recreates the included files and
//! their dependencies through the transform pipeline. Files in the target
//! tree that do not carry the banner are never touched.

use crate::config::Config;
use crate::error::VendorError;
use crate::operations::banner::has_banner;
use crate::operations::dependencies::resolve_dependencies;
use crate::operations::editor::{lock_key, update_readonly_files};
use crate::operations::hooks::{HookStage, run_hook};
use crate::operations::patch::apply_patch;
use crate::operations::remove::remove_managed;
use crate::system::{System, WalkOptions};
use crate::transforms::rules::IncludeFilter;
use crate::transforms::{Pipeline, TransformLoader};
use crate::utils::fs::write_file;
use crate::utils::path::{join_slash, relative_slash, validate_relative_path};
use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

/// Paths touched by a sync, relative to the target root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub removed_files: Vec<String>,
    pub new_files: Vec<String>,
}

/// Runs syncs against one configuration
pub struct SyncOperation<'a> {
    system: &'a dyn System,
    config: &'a Config,
}

impl<'a> SyncOperation<'a> {
    #[must_use]
    pub const fn new(system: &'a dyn System, config: &'a Config) -> Self {
        Self { system, config }
    }

    /// Run a full sync
    ///
    /// Order: before hook, removal of managed files, regeneration, after
    /// hook, editor settings. Without a target path only the hooks run.
    ///
    /// # Errors
    ///
    /// Returns an error if a hook fails, dependency resolution fails, a
    /// transform cannot be loaded or applied, or a file cannot be written.
    pub fn execute(&self) -> Result<SyncReport> {
        let target = &self.config.target;
        run_hook(target.hooks.as_ref(), HookStage::Before)?;

        let mut report = SyncReport::default();

        if let Some(target_root) = self.config.target_root() {
            report.removed_files =
                remove_managed(self.system, &target_root, &target.remove_vendors)?;
            if !report.removed_files.is_empty() {
                info!("Removed {} managed file(s)", report.removed_files.len());
            }

            let files = self.collect_files()?;
            debug!("{} file(s) selected for vendoring", files.len());

            let pipeline = self.pipeline()?;
            for file in &files {
                if let Some(written) = self.vendor_file(&pipeline, &target_root, file, true)? {
                    report.new_files.push(written);
                }
            }
            info!("✓ Vendored {} file(s) into {}", report.new_files.len(), target_root.display());
        } else {
            debug!("No target path configured, only running hooks");
        }

        run_hook(target.hooks.as_ref(), HookStage::After)?;

        self.update_editor_lock(&report);

        Ok(report)
    }

    /// Regenerate a single file without running hooks
    ///
    /// `relative_path` is relative to the source root. An existing managed
    /// target file is replaced; an unmanaged one is left alone. Returns the
    /// written target-relative path, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if no target path is configured, or the file cannot
    /// be read, transformed or written.
    pub fn sync_file(&self, relative_path: &str) -> Result<Option<String>> {
        let target_root = self.config.target_root().ok_or_else(|| {
            VendorError::configuration("Target path not defined in configuration")
        })?;

        let relative_path = relative_path.trim_start_matches("./");
        validate_relative_path(relative_path)?;

        let existing = join_slash(&target_root, relative_path);
        if self.system.is_file(&existing) {
            let content = self
                .system
                .read_to_string(&existing)
                .with_context(|| format!("Failed to read {}", existing.display()))?;
            if has_banner(&content) {
                self.system
                    .remove_file(&existing)
                    .with_context(|| format!("Failed to remove {}", existing.display()))?;
                debug!("Removed managed file {}", relative_path);
            }
        }

        let pipeline = self.pipeline()?;
        let written = self.vendor_file(&pipeline, &target_root, relative_path, false)?;

        if let Some(path) = written.as_ref() {
            info!("✓ Vendored {}", path);
            self.update_editor_lock(&SyncReport {
                removed_files: Vec::new(),
                new_files: vec![path.clone()],
            });
        }

        Ok(written)
    }

    /// Included files followed by their dependencies, without duplicates
    fn collect_files(&self) -> Result<Vec<String>> {
        let source_root = self.config.source_root();
        let included = expand_includes(self.system, &source_root, &self.config.target.includes)?;

        if self.config.target.exclude_dependencies {
            return Ok(included);
        }

        // The resolved closure starts with the included files themselves
        resolve_dependencies(self.system, &source_root, &included)
    }

    fn pipeline(&self) -> Result<Pipeline> {
        let mut loader = TransformLoader::new(self.system);
        Pipeline::from_target(&self.config.target, &mut loader, self.config.banner())
    }

    /// Transform and write one source file
    ///
    /// With `skip_original` set, a file whose untransformed target path is
    /// occupied is skipped before the pipeline runs.
    fn vendor_file(
        &self,
        pipeline: &Pipeline,
        target_root: &Path,
        relative: &str,
        skip_original: bool,
    ) -> Result<Option<String>> {
        if skip_original && self.system.exists(&join_slash(target_root, relative)) {
            debug!("Skipping {}: an unmanaged file occupies the target", relative);
            return Ok(None);
        }

        let source_file = join_slash(&self.config.source_root(), relative);
        let content = self.system.read_to_string(&source_file).map_err(|err| {
            VendorError::filesystem(format!(
                "Failed to read source file {}: {err}",
                source_file.display()
            ))
        })?;

        let processed = pipeline.apply(relative, &content)?;
        let output = join_slash(target_root, &processed.path);
        if self.system.exists(&output) {
            debug!(
                "Skipping {}: an unmanaged file occupies {}",
                relative, processed.path
            );
            return Ok(None);
        }

        write_file(self.system, &output, &processed.content).map_err(|err| {
            VendorError::filesystem(format!("Failed to write {}: {err:#}", output.display()))
        })?;
        debug!("Wrote {}", processed.path);

        apply_patch(self.system, self.config, &processed.path)?;

        Ok(Some(processed.path))
    }

    /// Lock new files and unlock removed ones; failures are only logged
    fn update_editor_lock(&self, report: &SyncReport) {
        let (Some(settings), Some(target_root)) =
            (self.config.editor_settings(), self.config.target_root())
        else {
            return;
        };

        let keys = |files: &[String]| -> Vec<String> {
            files
                .iter()
                .map(|file| lock_key(&target_root, file))
                .collect()
        };

        let settings = match self.system.current_dir() {
            Ok(cwd) => cwd.join(settings),
            Err(_) => settings,
        };

        if let Err(err) = update_readonly_files(
            self.system,
            &settings,
            &keys(&report.removed_files),
            &keys(&report.new_files),
        ) {
            warn!("✗ Failed to update editor settings: {:#}", err);
        }
    }
}

/// Run a full sync of `config`
///
/// # Errors
///
/// See [`SyncOperation::execute`].
pub fn sync(system: &dyn System, config: &Config) -> Result<SyncReport> {
    SyncOperation::new(system, config).execute()
}

/// Regenerate one source-relative file of `config`
///
/// # Errors
///
/// See [`SyncOperation::sync_file`].
pub fn sync_file(system: &dyn System, config: &Config, relative_path: &str) -> Result<Option<String>> {
    SyncOperation::new(system, config).sync_file(relative_path)
}

/// Expand include globs over the source tree
///
/// Patterns starting with `!` exclude what they match. Returns
/// source-relative `/`-separated paths in sorted walk order.
///
/// # Errors
///
/// Returns an error if a glob does not compile or the source tree cannot be
/// walked.
pub fn expand_includes(
    system: &dyn System,
    source_root: &Path,
    includes: &[String],
) -> Result<Vec<String>> {
    if includes.is_empty() {
        return Ok(Vec::new());
    }

    if !system.is_dir(source_root) {
        return Err(VendorError::from_source(format!(
            "Source path does not exist: {}",
            source_root.display()
        ))
        .into());
    }

    let filter = IncludeFilter::build(includes)?;
    let entries = system
        .walk_dir(source_root, WalkOptions::everything())
        .with_context(|| format!("Failed to walk source directory: {}", source_root.display()))?;

    let mut seen = HashSet::new();
    Ok(entries
        .iter()
        .filter(|entry| entry.is_file)
        .filter_map(|entry| relative_slash(source_root, &entry.path))
        .filter(|relative| filter.is_match(relative))
        .filter(|relative| seen.insert(relative.clone()))
        .collect())
}
