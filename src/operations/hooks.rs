//! Before/after hook execution

use crate::config::Hooks;
use crate::error::VendorError;
use anyhow::{Context as _, Result};
use std::process::Command;
use tracing::info;

/// Point in an operation where a hook runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Before,
    After,
}

impl HookStage {
    const fn label(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Run the hook configured for `stage`, if any
///
/// The command runs through the platform shell from the current working
/// directory, with inherited stdio.
///
/// # Errors
///
/// Returns a hook error if the command cannot be spawned or exits with a
/// non-zero status.
pub fn run_hook(hooks: Option<&Hooks>, stage: HookStage) -> Result<()> {
    let command = match (hooks, stage) {
        (Some(hooks), HookStage::Before) => hooks.before.as_deref(),
        (Some(hooks), HookStage::After) => hooks.after.as_deref(),
        (None, _) => None,
    };

    match command {
        Some(command) => execute_hook(command, stage.label()),
        None => Ok(()),
    }
}

fn execute_hook(command: &str, label: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(VendorError::hook(format!("The {label} hook is empty")).into());
    }

    info!("Running {} hook: {}", label, command);

    let (shell, shell_arg) = get_shell_command();
    let status = Command::new(shell)
        .arg(shell_arg)
        .arg(command)
        .status()
        .with_context(|| format!("Failed to execute {label} hook: {command}"))
        .map_err(|err| VendorError::hook(format!("{err:#}")))?;

    if !status.success() {
        return Err(VendorError::hook(format!(
            "The {} hook failed with exit code {}: {}",
            label,
            status.code().unwrap_or(-1),
            command
        ))
        .into());
    }

    info!("✓ {} hook completed", label);
    Ok(())
}

/// Get the appropriate shell command for the current platform
const fn get_shell_command() -> (&'static str, &'static str) {
    if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hooks(before: Option<&str>, after: Option<&str>) -> Hooks {
        Hooks {
            before: before.map(str::to_owned),
            after: after.map(str::to_owned),
        }
    }

    #[test]
    fn missing_hooks_are_a_no_op() {
        run_hook(None, HookStage::Before).unwrap();
        run_hook(Some(&hooks(None, None)), HookStage::After).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn successful_hook_passes() {
        run_hook(Some(&hooks(Some("true"), None)), HookStage::Before).unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn failing_hook_is_a_hook_error() {
        let err = run_hook(Some(&hooks(None, Some("exit 3"))), HookStage::After).unwrap_err();
        let vendor = err.downcast_ref::<VendorError>().unwrap();

        assert_eq!(vendor.exit_code(), 3);
        assert!(vendor.to_string().contains("after hook failed with exit code 3"));
    }
}
