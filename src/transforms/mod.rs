//! Content and path transforms applied while vendoring
//!
//! A transform maps the current `(content, path)` pair of a file to a
//! [`TransformOutcome`]. Transforms come from three places: inline in the
//! configuration, a global folder applied to every file, and a per-file
//! folder whose layout mirrors the target tree.

pub mod loader;
pub mod pipeline;
pub mod rules;

pub use loader::{LoadedTransform, TransformLoader};
pub use pipeline::{Pipeline, Processed};
pub use rules::{CompiledTransform, Rule, TransformSpec};

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

/// Result of a single transform stage
///
/// Absent or empty fields leave the previous value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOutcome {
    pub content: Option<String>,
    pub path: Option<String>,
}

impl TransformOutcome {
    /// Outcome that changes nothing
    #[must_use]
    pub const fn unchanged() -> Self {
        Self {
            content: None,
            path: None,
        }
    }

    /// Outcome replacing only the content
    #[must_use]
    pub fn with_content<S: Into<String>>(content: S) -> Self {
        Self {
            content: Some(content.into()),
            path: None,
        }
    }

    /// Outcome replacing only the path
    #[must_use]
    pub fn with_path<S: Into<String>>(path: S) -> Self {
        Self {
            content: None,
            path: Some(path.into()),
        }
    }

    /// Merge this outcome into the running values
    pub fn merge_into(self, content: &mut String, path: &mut String) {
        if let Some(new_content) = self.content.filter(|value| !value.is_empty()) {
            *content = new_content;
        }
        if let Some(new_path) = self.path.filter(|value| !value.is_empty()) {
            *path = new_path;
        }
    }
}

/// A unit mapping `(content, path)` to an outcome
pub trait Transform: Send + Sync {
    fn transform(&self, content: &str, path: &str) -> TransformOutcome;
}

impl<F> Transform for F
where
    F: Fn(&str, &str) -> TransformOutcome + Send + Sync,
{
    fn transform(&self, content: &str, path: &str) -> TransformOutcome {
        self(content, path)
    }
}

/// Transform listed inline in the target configuration
#[derive(Clone)]
pub enum InlineTransform {
    /// Declarative rules read from the configuration file
    Rules(TransformSpec),
    /// Arbitrary transform supplied by a library caller
    Custom(Arc<dyn Transform>),
}

impl InlineTransform {
    /// Wrap a closure or any other [`Transform`] implementation
    pub fn custom<T: Transform + 'static>(transform: T) -> Self {
        Self::Custom(Arc::new(transform))
    }
}

impl fmt::Debug for InlineTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rules(spec) => f.debug_tuple("Rules").field(spec).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for InlineTransform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        TransformSpec::deserialize(deserializer).map(Self::Rules)
    }
}
