//! Configuration management module
//!
//! Handles YAML/JSON configuration parsing, JSON schema validation, and
//! semantic validation of the source and target sections.

pub mod schema;
pub mod validation;
pub mod yaml;

use crate::operations::banner::Banner;
use crate::system::System;
use crate::transforms::InlineTransform;
use serde::Deserialize;
use std::path::PathBuf;

/// Default configuration file looked up by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "./vendorism.yaml";

/// Default editor settings file used when locking is simply enabled
pub const DEFAULT_EDITOR_SETTINGS: &str = ".vscode/settings.json";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Where the upstream files live and how to fetch them
    #[serde(alias = "get")]
    pub source: SourceConfig,

    /// Where vendored files are written and how they are rewritten
    #[serde(default, alias = "set")]
    pub target: TargetConfig,
}

/// Shell commands run around an operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Hooks {
    pub before: Option<String>,
    pub after: Option<String>,
}

/// Source tree configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceConfig {
    /// Base path of the source files
    pub path: String,

    /// Remote or local location the source is fetched from
    pub url: Option<String>,

    pub hooks: Option<Hooks>,

    pub download: Option<DownloadConfig>,
}

/// Options for fetching the source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DownloadConfig {
    /// Git reference (branch, tag, or commit) to check out
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,

    /// Only check out this subdirectory of the repository
    pub subdirectory: Option<String>,

    /// Empty the source path before fetching
    #[serde(default)]
    pub clean: bool,
}

/// Target tree configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TargetConfig {
    /// Base path of the vendored files; nothing is written without it
    pub path: Option<String>,

    /// Globs over the source tree selecting files to vendor
    #[serde(default)]
    pub includes: Vec<String>,

    /// Skip the dependency closure of included files
    #[serde(default)]
    pub exclude_dependencies: bool,

    /// Ordered inline transforms
    #[serde(default)]
    pub transforms: Vec<InlineTransform>,

    /// Folder of transform files applied to every file
    pub global_transform_folder: Option<String>,

    /// Folder of transform files mirroring target-relative paths
    pub file_transform_folder: Option<String>,

    /// Folder storing patches of manual edits
    pub patch_folder: Option<String>,

    pub hooks: Option<Hooks>,

    /// Banner text replacing every built-in variant
    pub banner: Option<String>,

    #[serde(default)]
    pub remove_vendors: RemoveOptions,

    /// Mark vendored files read-only in editor settings
    pub lock_files_for_vs_code: Option<EditorLock>,
}

/// Which files the vendor remover considers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoveOptions {
    /// Skip files excluded by ignore files
    #[serde(default = "default_true")]
    pub gitignore: bool,

    /// Include dot-files
    #[serde(default = "default_true")]
    pub dot: bool,

    /// Additional globs never removed
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Default for RemoveOptions {
    fn default() -> Self {
        Self {
            gitignore: true,
            dot: true,
            ignore: Vec::new(),
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Editor lock setting: a switch or a custom settings path
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EditorLock {
    Enabled(bool),
    SettingsPath(String),
}

impl EditorLock {
    /// Settings file to update, if locking is enabled
    #[must_use]
    pub fn settings_path(&self) -> Option<PathBuf> {
        match self {
            Self::Enabled(true) => Some(PathBuf::from(DEFAULT_EDITOR_SETTINGS)),
            Self::Enabled(false) => None,
            Self::SettingsPath(path) => Some(PathBuf::from(path)),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(system: &dyn System, path: &str) -> anyhow::Result<Self> {
        yaml::load_config(system, path)
    }

    /// Validate configuration semantics
    pub fn validate(&self) -> anyhow::Result<()> {
        validation::validate_config(self)
    }

    #[must_use]
    pub fn source_root(&self) -> PathBuf {
        PathBuf::from(&self.source.path)
    }

    #[must_use]
    pub fn target_root(&self) -> Option<PathBuf> {
        self.target.path.as_ref().map(PathBuf::from)
    }

    /// Banner set for this configuration
    #[must_use]
    pub fn banner(&self) -> Banner {
        Banner::new(self.target.banner.clone())
    }

    /// Editor settings file, if locking is enabled
    #[must_use]
    pub fn editor_settings(&self) -> Option<PathBuf> {
        self.target
            .lock_files_for_vs_code
            .as_ref()
            .and_then(EditorLock::settings_path)
    }
}
