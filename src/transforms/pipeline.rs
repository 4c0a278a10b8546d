//! Ordered application of transforms to a single file

use super::loader::{LoadedTransform, TransformLoader};
use super::rules::CompiledTransform;
use super::{InlineTransform, Transform};
use crate::config::TargetConfig;
use crate::error::VendorError;
use crate::operations::banner::Banner;
use crate::utils::path::validate_relative_path;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A file after every transform stage ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    /// Target-relative output path, `/`-separated
    pub path: String,
    pub content: String,
}

/// Inline, global and per-file transforms followed by the banner stamp
pub struct Pipeline {
    inline: Vec<Arc<dyn Transform>>,
    global: Vec<LoadedTransform>,
    per_file: Vec<LoadedTransform>,
    banner: Banner,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        inline: Vec<Arc<dyn Transform>>,
        global: Vec<LoadedTransform>,
        per_file: Vec<LoadedTransform>,
        banner: Banner,
    ) -> Self {
        Self {
            inline,
            global,
            per_file,
            banner,
        }
    }

    /// Build the pipeline for a target, loading transform folders once
    ///
    /// # Errors
    ///
    /// Returns an error if an inline transform does not compile or a
    /// transform folder cannot be loaded.
    pub fn from_target(
        target: &TargetConfig,
        loader: &mut TransformLoader<'_>,
        banner: Banner,
    ) -> Result<Self> {
        let inline = target
            .transforms
            .iter()
            .enumerate()
            .map(|(index, transform)| -> Result<Arc<dyn Transform>> {
                match transform {
                    InlineTransform::Rules(spec) => {
                        let name = format!("inline #{}", index + 1);
                        Ok(Arc::new(CompiledTransform::compile(spec, &name)?))
                    }
                    InlineTransform::Custom(custom) => Ok(Arc::clone(custom)),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let global = match target.global_transform_folder.as_deref() {
            Some(folder) => loader.load(Path::new(folder))?,
            None => Vec::new(),
        };
        let per_file = match target.file_transform_folder.as_deref() {
            Some(folder) => loader.load(Path::new(folder))?,
            None => Vec::new(),
        };

        debug!(
            "Pipeline ready: {} inline, {} global, {} per-file transform(s)",
            inline.len(),
            global.len(),
            per_file.len()
        );

        Ok(Self::new(inline, global, per_file, banner))
    }

    /// Run every stage on `(path, content)`
    ///
    /// # Errors
    ///
    /// Returns a transform error if the final path is absolute or escapes
    /// the target root.
    pub fn apply(&self, path: &str, content: &str) -> Result<Processed> {
        let mut current_path = path.to_owned();
        let mut current_content = content.to_owned();

        for transform in &self.inline {
            run_stage(transform.as_ref(), &mut current_content, &mut current_path);
        }

        for loaded in &self.global {
            run_stage(loaded.unit.as_ref(), &mut current_content, &mut current_path);
        }

        for loaded in &self.per_file {
            if loaded.relative_path == current_path {
                debug!(
                    "Applying per-file transform {} to {}",
                    loaded.source_path.display(),
                    current_path
                );
                run_stage(loaded.unit.as_ref(), &mut current_content, &mut current_path);
            }
        }

        validate_relative_path(&current_path).map_err(|err| {
            VendorError::transform(format!(
                "Transformed path for '{path}' is not usable: {err}"
            ))
        })?;

        let stamped = self.banner.apply(&current_content, &current_path);

        Ok(Processed {
            path: current_path,
            content: stamped,
        })
    }
}

fn run_stage(transform: &dyn Transform, content: &mut String, path: &mut String) {
    let outcome = transform.transform(content, path);
    outcome.merge_into(content, path);
}
