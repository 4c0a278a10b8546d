//! `vendorism` - vendor files from a source tree into a project
//!
//! Files selected by include globs, plus their local dependencies, are copied
//! from the source tree into the target tree through a transform pipeline and
//! stamped with a banner. Banner-tagged files are managed: every sync removes
//! and regenerates them, while untagged files are never touched.

pub mod cli;
pub mod config;
pub mod error;
pub mod operations;
pub mod system;
pub mod transforms;
pub mod utils;

use anyhow::Result;
use cli::{Args, Command};
use config::Config;
use system::{RealSystem, System};
use tracing::info;

/// Main entry point for the vendorism library
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails.
pub fn run(args: &Args) -> Result<()> {
    let system = RealSystem::new();
    let config = Config::load_from_file(&system, args.command.config_path())?;

    match &args.command {
        Command::Get { .. } => run_source(&system, &config),
        Command::Set { file: None, .. } => run_target(&system, &config),
        Command::Set {
            file: Some(file), ..
        } => run_target_file(&system, &config, file),
        Command::Eject { file, .. } => run_eject(&system, &config, file),
        Command::Diff { file, .. } => run_diff(&system, &config, file),
    }
}

/// Fetch the source tree
///
/// # Errors
///
/// Returns an error if a hook fails or the source cannot be fetched.
pub fn run_source(system: &dyn System, config: &Config) -> Result<()> {
    operations::fetch_source(system, config)
}

/// Regenerate every vendored file
///
/// # Errors
///
/// Returns an error if the sync fails.
pub fn run_target(system: &dyn System, config: &Config) -> Result<()> {
    let report = operations::sync(system, config)?;
    info!(
        "✓ Sync complete: {} removed, {} written",
        report.removed_files.len(),
        report.new_files.len()
    );
    Ok(())
}

/// Regenerate a single vendored file
///
/// # Errors
///
/// Returns an error if the file cannot be regenerated.
pub fn run_target_file(system: &dyn System, config: &Config, file: &str) -> Result<()> {
    if operations::sync_file(system, config, file)?.is_none() {
        info!("{} was not written: an unmanaged file occupies its target", file);
    }
    Ok(())
}

/// Detach a vendored file from management
///
/// # Errors
///
/// Returns an error if the file cannot be found or rewritten.
pub fn run_eject(system: &dyn System, config: &Config, file: &str) -> Result<()> {
    operations::eject(system, config, file).map(|_| ())
}

/// Record manual edits of a vendored file
///
/// # Errors
///
/// Returns an error if the patch cannot be created.
pub fn run_diff(system: &dyn System, config: &Config, file: &str) -> Result<()> {
    operations::create_diff(system, config, file).map(|_| ())
}
