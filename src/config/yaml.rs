//! Configuration file loading and parsing

use crate::config::Config;
use crate::error::VendorError;
use crate::system::System;
use anyhow::{Context as _, Result};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Load, schema-check and validate a YAML or JSON configuration file
///
/// # Errors
///
/// Returns a configuration error if the file is missing, does not parse,
/// violates the schema, or fails semantic validation.
pub fn load_config(system: &dyn System, path: &str) -> Result<Config> {
    let path_obj = Path::new(path);

    if !system.exists(path_obj) {
        return Err(VendorError::configuration(format!(
            "Configuration file not found: {path}\n\
            Create a vendorism.yaml file or specify a different path with --config"
        ))
        .into());
    }

    let content = system
        .read_to_string(path_obj)
        .with_context(|| format!("Failed to read configuration file: {path}"))?;

    let value = parse_document(path_obj, &content)?;
    debug!("Parsed configuration file {}", path);

    crate::config::schema::validate_against_schema(&value)?;

    let config: Config = serde_json::from_value(value).map_err(|err| {
        VendorError::configuration(format!(
            "Invalid configuration in file {path}: {err}"
        ))
    })?;

    crate::config::validation::validate_config(&config)
        .with_context(|| format!("Configuration validation failed for {path}"))?;

    Ok(config)
}

/// Parse configuration text into a JSON value, choosing the format by extension
///
/// # Errors
///
/// Returns a configuration error if the document does not parse.
pub fn parse_document(path: &Path, content: &str) -> Result<Value> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str::<Value>(content).map_err(|err| err.to_string())
    } else {
        serde_yaml::from_str::<Value>(content).map_err(|err| err.to_string())
    };

    parsed.map_err(|err| {
        VendorError::configuration(format!(
            "Failed to parse configuration file {}: {err}\n\
            Please check the syntax and structure of your configuration file",
            path.display()
        ))
        .into()
    })
}
