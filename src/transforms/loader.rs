//! Discovery and loading of transform files
//!
//! Transform files are named `<relative path>.vendorism.<yaml|yml|json>`.
//! Every call to [`TransformLoader::load`] re-reads them from disk.

use super::rules::{CompiledTransform, TransformSpec};
use crate::error::VendorError;
use crate::system::{System, WalkOptions};
use crate::utils::path::{normalize_path, relative_slash};
use anyhow::{Context as _, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Suffixes recognised as transform files
const TRANSFORM_SUFFIXES: [&str; 3] = [".vendorism.yaml", ".vendorism.yml", ".vendorism.json"];

/// A transform unit together with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedTransform {
    pub unit: Arc<CompiledTransform>,
    /// File the unit was read from
    pub source_path: PathBuf,
    /// Folder-relative path with the transform suffix stripped
    pub relative_path: String,
}

/// Loads transform folders and remembers the last unit read per file
pub struct TransformLoader<'a> {
    system: &'a dyn System,
    records: HashMap<PathBuf, Arc<CompiledTransform>>,
}

impl<'a> TransformLoader<'a> {
    #[must_use]
    pub fn new(system: &'a dyn System) -> Self {
        Self {
            system,
            records: HashMap::new(),
        }
    }

    /// Load every transform file under `folder` in sorted walk order
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The folder cannot be walked
    /// - A transform file cannot be read or parsed
    /// - A transform rule does not compile
    pub fn load(&mut self, folder: &Path) -> Result<Vec<LoadedTransform>> {
        if !self.system.is_dir(folder) {
            return Err(VendorError::transform(format!(
                "Transform folder does not exist: {}",
                folder.display()
            ))
            .into());
        }

        let entries = self
            .system
            .walk_dir(folder, WalkOptions::default())
            .with_context(|| format!("Failed to walk transform folder: {}", folder.display()))?;

        let mut loaded = Vec::new();
        for entry in entries.iter().filter(|entry| entry.is_file) {
            let Some(relative) = relative_slash(folder, &entry.path) else {
                continue;
            };
            let Some((stripped, suffix)) = strip_transform_suffix(&relative) else {
                continue;
            };

            let spec = self.read_spec(&entry.path, suffix)?;
            let unit = Arc::new(CompiledTransform::compile(&spec, &relative)?);

            let absolute = self.absolute(&entry.path)?;
            self.records.insert(absolute, Arc::clone(&unit));

            debug!("Loaded transform {} for '{}'", unit.name(), stripped);
            loaded.push(LoadedTransform {
                unit,
                source_path: entry.path.clone(),
                relative_path: stripped.to_owned(),
            });
        }

        Ok(loaded)
    }

    /// Units most recently loaded, keyed by absolute file path
    #[must_use]
    pub const fn records(&self) -> &HashMap<PathBuf, Arc<CompiledTransform>> {
        &self.records
    }

    fn read_spec(&self, path: &Path, suffix: &str) -> Result<TransformSpec> {
        let content = self
            .system
            .read_to_string(path)
            .with_context(|| format!("Failed to read transform file: {}", path.display()))?;

        let parsed = if suffix.ends_with("json") {
            serde_json::from_str(&content).map_err(|err| err.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|err| err.to_string())
        };

        parsed.map_err(|err| {
            VendorError::transform(format!(
                "Failed to parse transform file {}: {err}",
                path.display()
            ))
            .into()
        })
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        if path.is_absolute() {
            return Ok(normalize_path(path));
        }
        let cwd = self
            .system
            .current_dir()
            .context("Failed to determine the current directory")?;
        Ok(normalize_path(&cwd.join(path)))
    }
}

fn strip_transform_suffix(relative: &str) -> Option<(&str, &'static str)> {
    TRANSFORM_SUFFIXES.iter().find_map(|suffix| {
        relative
            .strip_suffix(suffix)
            .filter(|stripped| !stripped.is_empty())
            .map(|stripped| (stripped, *suffix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;
    use crate::transforms::{Transform as _, TransformOutcome};

    #[test]
    fn strips_known_suffixes_only() {
        assert_eq!(
            strip_transform_suffix("lib/index.js.vendorism.yaml"),
            Some(("lib/index.js", ".vendorism.yaml"))
        );
        assert_eq!(
            strip_transform_suffix("a.js.vendorism.json"),
            Some(("a.js", ".vendorism.json"))
        );
        assert_eq!(strip_transform_suffix("a.js.vendorism.js"), None);
        assert_eq!(strip_transform_suffix(".vendorism.yml"), None);
        assert_eq!(strip_transform_suffix("notes.md"), None);
    }

    #[test]
    fn loads_yaml_and_json_in_sorted_order() {
        let system = MockSystem::new()
            .with_current_dir("/project")
            .unwrap()
            .with_file(
                "/project/transforms/b.js.vendorism.yaml",
                b"content:\n  - replace: b\n    with: B\n",
            )
            .unwrap()
            .with_file(
                "/project/transforms/a.js.vendorism.json",
                br#"{"content": [{"replace": "a", "with": "A"}]}"#,
            )
            .unwrap()
            .with_file("/project/transforms/README.md", b"ignored")
            .unwrap();

        let mut loader = TransformLoader::new(&system);
        let loaded = loader.load(Path::new("/project/transforms")).unwrap();

        let relative: Vec<_> = loaded.iter().map(|t| t.relative_path.as_str()).collect();
        assert_eq!(relative, vec!["a.js", "b.js"]);
        assert_eq!(
            loaded[0].unit.transform("abc", "a.js"),
            TransformOutcome::with_content("Abc")
        );
        assert_eq!(loader.records().len(), 2);
    }

    #[test]
    fn reloads_on_every_call() {
        let system = MockSystem::new()
            .with_file(
                "/transforms/x.js.vendorism.yaml",
                b"content:\n  - replace: x\n    with: one\n",
            )
            .unwrap();
        let mut loader = TransformLoader::new(&system);

        let first = loader.load(Path::new("/transforms")).unwrap();
        assert_eq!(
            first[0].unit.transform("x", "x.js").content.as_deref(),
            Some("one")
        );

        system
            .write(
                Path::new("/transforms/x.js.vendorism.yaml"),
                b"content:\n  - replace: x\n    with: two\n",
            )
            .unwrap();
        let second = loader.load(Path::new("/transforms")).unwrap();
        assert_eq!(
            second[0].unit.transform("x", "x.js").content.as_deref(),
            Some("two")
        );
        assert_eq!(loader.records().len(), 1);
    }

    #[test]
    fn malformed_file_is_a_transform_error() {
        let system = MockSystem::new()
            .with_file("/transforms/bad.js.vendorism.yaml", b"content: [ {")
            .unwrap();
        let mut loader = TransformLoader::new(&system);

        let err = loader.load(Path::new("/transforms")).unwrap_err();
        let vendor = err.downcast_ref::<VendorError>().unwrap();
        assert_eq!(vendor.exit_code(), 5);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let system = MockSystem::new();
        let mut loader = TransformLoader::new(&system);
        assert!(loader.load(Path::new("/nowhere")).is_err());
    }
}
