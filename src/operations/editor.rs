//! Read-only bookkeeping in editor settings
//!
//! Vendored files are listed under `files.readonlyInclude` so the editor
//! refuses accidental edits.

use crate::error::VendorError;
use crate::system::System;
use crate::utils::fs::write_file;
use crate::utils::path::{join_slash, normalize_path, to_slash};
use anyhow::{Context as _, Result};
use serde::Serialize as _;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::path::Path;

const READONLY_KEY: &str = "files.readonlyInclude";

/// Key used for a target-relative file in the settings map
#[must_use]
pub fn lock_key(target_root: &Path, relative: &str) -> String {
    to_slash(&normalize_path(&join_slash(target_root, relative)))
}

/// Unlock `remove` and lock `add` in the settings file at `settings_path`
///
/// Existing entries and unrelated settings are preserved.
///
/// # Errors
///
/// Returns an error if the settings file exists but is not a JSON object,
/// or if it cannot be written.
pub fn update_readonly_files(
    system: &dyn System,
    settings_path: &Path,
    remove: &[String],
    add: &[String],
) -> Result<()> {
    let mut settings = if system.exists(settings_path) {
        let raw = system
            .read_to_string(settings_path)
            .with_context(|| format!("Failed to read {}", settings_path.display()))?;
        if raw.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&raw).with_context(|| {
                format!("Failed to parse editor settings: {}", settings_path.display())
            })?
        }
    } else {
        Value::Object(Map::new())
    };

    let Value::Object(root) = &mut settings else {
        return Err(VendorError::filesystem(format!(
            "Editor settings must be a JSON object: {}",
            settings_path.display()
        ))
        .into());
    };

    let readonly = root
        .entry(READONLY_KEY)
        .or_insert_with(|| Value::Object(Map::new()));
    if !readonly.is_object() {
        *readonly = Value::Object(Map::new());
    }

    if let Value::Object(entries) = readonly {
        for file in remove {
            entries.remove(file);
        }
        for file in add {
            entries.entry(file.clone()).or_insert(Value::Bool(true));
        }
    }

    write_file(system, settings_path, &to_pretty_json(&settings)?)
}

/// Serialize with a four space indent
fn to_pretty_json(value: &Value) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    value
        .serialize(&mut serializer)
        .context("Failed to serialize editor settings")?;
    String::from_utf8(buffer).context("Editor settings are not valid UTF-8")
}
