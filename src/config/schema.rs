//! JSON Schema validation for vendorism configuration

use crate::error::VendorError;
use anyhow::{Result, anyhow};
use jsonschema::Validator;
use serde_json::Value;

/// Build a validator for the embedded configuration schema
pub fn get_schema() -> Result<Validator> {
    let schema_str = include_str!("../../docs/schema.json");
    let schema: Value = serde_json::from_str(schema_str)
        .map_err(|e| anyhow!("Failed to parse embedded JSON schema: {e}"))?;

    jsonschema::draft7::new(&schema).map_err(|e| anyhow!("Failed to compile JSON schema: {e}"))
}

/// Validate a configuration value against the schema
pub fn validate_against_schema(config: &Value) -> Result<()> {
    let validator = get_schema()?;

    let error_messages: Vec<String> = validator
        .iter_errors(config)
        .map(|e| format!("  - {e}"))
        .collect();

    if !error_messages.is_empty() {
        return Err(VendorError::configuration(format!(
            "Configuration does not match the schema:\n{}",
            error_messages.join("\n")
        ))
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedded_schema_compiles() {
        assert!(get_schema().is_ok());
    }

    #[test]
    fn accepts_a_complete_configuration() {
        let config = json!({
            "source": {
                "path": "./vendor/source",
                "url": "https://github.com/acme/widgets.git",
                "hooks": { "before": "echo before", "after": "echo after" },
                "download": { "ref": "main", "subdirectory": "packages/ui", "clean": true }
            },
            "target": {
                "path": "./src/vendor",
                "includes": ["**/*.js"],
                "excludeDependencies": false,
                "transforms": [
                    { "content": [{ "replace": "Hello", "with": "Goodbye" }] },
                    { "files": ["*.css"], "path": [{ "regex": "\\.css$", "with": ".scss" }] }
                ],
                "globalTransformFolder": "./transforms/global",
                "fileTransformFolder": "./transforms/files",
                "patchFolder": "./patches",
                "banner": "/* @vendorism */\n",
                "removeVendors": { "gitignore": true, "dot": false, "ignore": ["keep/**"] },
                "lockFilesForVsCode": true
            }
        });

        validate_against_schema(&config).unwrap();
    }

    #[test]
    fn rejects_unknown_keys_and_wrong_types() {
        let unknown = json!({ "source": { "path": "a" }, "target": { "paths": "b" } });
        assert!(validate_against_schema(&unknown).is_err());

        let wrong_type = json!({ "source": { "path": "a" }, "target": { "includes": "*.js" } });
        assert!(validate_against_schema(&wrong_type).is_err());

        let missing_source = json!({ "target": { "path": "b" } });
        assert!(validate_against_schema(&missing_source).is_err());
    }

    #[test]
    fn section_aliases_are_exclusive() {
        let aliased = json!({ "get": { "path": "a" }, "set": { "path": "b", "includes": ["*"] } });
        validate_against_schema(&aliased).unwrap();

        let both_sources = json!({ "source": { "path": "a" }, "get": { "path": "b" } });
        assert!(validate_against_schema(&both_sources).is_err());

        let both_targets = json!({ "source": { "path": "a" }, "target": {}, "set": {} });
        assert!(validate_against_schema(&both_targets).is_err());
    }

    #[test]
    fn rejects_malformed_rules() {
        let config = json!({
            "source": { "path": "a" },
            "target": { "transforms": [{ "content": [{ "replace": "x" }] }] }
        });
        assert!(validate_against_schema(&config).is_err());
    }
}
