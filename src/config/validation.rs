//! Configuration validation logic

use crate::config::{Config, EditorLock, Hooks, TargetConfig};
use crate::error::VendorError;
use crate::operations::banner::TAG;
use crate::transforms::InlineTransform;
use crate::transforms::rules::{CompiledTransform, IncludeFilter, build_glob_set};
use anyhow::Result;

/// Validate a complete configuration
///
/// # Errors
///
/// Returns a configuration error if:
/// - The source path is empty
/// - A hook command is blank
/// - A target path is set without any include globs
/// - An include or ignore glob does not compile
/// - The banner override does not carry the management tag
/// - An inline transform does not compile
pub fn validate_config(config: &Config) -> Result<()> {
    if config.source.path.trim().is_empty() {
        return Err(VendorError::configuration("Source path cannot be empty").into());
    }

    if let Some(url) = config.source.url.as_ref()
        && url.trim().is_empty()
    {
        return Err(VendorError::configuration("Source URL cannot be empty").into());
    }

    if let Some(hooks) = config.source.hooks.as_ref() {
        validate_hooks(hooks, "source")?;
    }

    validate_target(&config.target)
}

fn validate_target(target: &TargetConfig) -> Result<()> {
    if let Some(hooks) = target.hooks.as_ref() {
        validate_hooks(hooks, "target")?;
    }

    if let Some(path) = target.path.as_ref() {
        if path.trim().is_empty() {
            return Err(VendorError::configuration("Target path cannot be empty").into());
        }
        if target.includes.is_empty() {
            return Err(VendorError::configuration(
                "Target 'includes' must list at least one glob when a target path is set",
            )
            .into());
        }
    }

    IncludeFilter::build(&target.includes)?;
    build_glob_set(&target.remove_vendors.ignore)?;

    if let Some(banner) = target.banner.as_ref()
        && !banner.contains(TAG)
    {
        return Err(VendorError::configuration(format!(
            "Banner override must contain the tag '{TAG}' so vendored files can be recognised"
        ))
        .into());
    }

    for (index, transform) in target.transforms.iter().enumerate() {
        if let InlineTransform::Rules(spec) = transform {
            let name = format!("inline #{}", index + 1);
            CompiledTransform::compile(spec, &name).map_err(|err| {
                VendorError::configuration(format!("Invalid inline transform: {err}"))
            })?;
        }
    }

    for (label, folder) in [
        ("globalTransformFolder", target.global_transform_folder.as_ref()),
        ("fileTransformFolder", target.file_transform_folder.as_ref()),
        ("patchFolder", target.patch_folder.as_ref()),
    ] {
        if folder.is_some_and(|value| value.trim().is_empty()) {
            return Err(VendorError::configuration(format!("{label} cannot be empty")).into());
        }
    }

    if let Some(EditorLock::SettingsPath(path)) = target.lock_files_for_vs_code.as_ref()
        && path.trim().is_empty()
    {
        return Err(
            VendorError::configuration("lockFilesForVsCode path cannot be empty").into(),
        );
    }

    Ok(())
}

fn validate_hooks(hooks: &Hooks, section: &str) -> Result<()> {
    for (stage, command) in [("before", &hooks.before), ("after", &hooks.after)] {
        if command.as_ref().is_some_and(|cmd| cmd.trim().is_empty()) {
            return Err(VendorError::configuration(format!(
                "{section}.hooks.{stage} cannot be empty"
            ))
            .into());
        }
    }
    Ok(())
}
