//! Declarative transform rules and their compiled form

use super::{Transform, TransformOutcome};
use crate::error::VendorError;
use anyhow::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

/// Transform unit as written in a configuration or transform file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformSpec {
    /// Optional label used in log output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Globs the current target-relative path must match; empty matches all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    /// Ordered rules applied to the file content
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Rule>,

    /// Ordered rules applied to the target-relative path
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<Rule>,
}

/// A single rewrite step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Rule {
    /// Replace every block starting with `between[0]` and ending with `between[1]`
    Between { between: [String; 2], with: String },
    /// Regex replacement with `$1` style capture expansion
    Regex { regex: String, with: String },
    /// Literal replacement of every occurrence
    Replace { replace: String, with: String },
    /// Insert text at the start
    Prepend { prepend: String },
    /// Insert text at the end
    Append { append: String },
}

#[derive(Debug, Clone)]
enum CompiledRule {
    Literal { needle: String, with: String },
    Block { pattern: Regex, with: String },
    Pattern { pattern: Regex, with: String },
    Prepend(String),
    Append(String),
}

impl CompiledRule {
    fn compile(rule: &Rule) -> Result<Self> {
        let compiled = match rule {
            Rule::Replace { replace, with } => {
                if replace.is_empty() {
                    return Err(VendorError::transform("'replace' text cannot be empty").into());
                }
                Self::Literal {
                    needle: replace.clone(),
                    with: with.clone(),
                }
            }
            Rule::Between { between, with } => {
                let [start, end] = between;
                if start.is_empty() || end.is_empty() {
                    return Err(
                        VendorError::transform("'between' delimiters cannot be empty").into(),
                    );
                }
                let source = format!(
                    "(?s){}.*?{}",
                    regex::escape(start),
                    regex::escape(end)
                );
                Self::Block {
                    pattern: compile_regex(&source)?,
                    with: with.clone(),
                }
            }
            Rule::Regex { regex, with } => Self::Pattern {
                pattern: compile_regex(regex)?,
                with: with.clone(),
            },
            Rule::Prepend { prepend } => Self::Prepend(prepend.clone()),
            Rule::Append { append } => Self::Append(append.clone()),
        };
        Ok(compiled)
    }

    fn apply(&self, input: &str) -> String {
        match self {
            Self::Literal { needle, with } => input.replace(needle.as_str(), with),
            Self::Block { pattern, with } => {
                pattern.replace_all(input, NoExpand(with)).into_owned()
            }
            Self::Pattern { pattern, with } => {
                pattern.replace_all(input, with.as_str()).into_owned()
            }
            Self::Prepend(text) => format!("{text}{input}"),
            Self::Append(text) => format!("{input}{text}"),
        }
    }
}

fn compile_regex(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|err| {
        anyhow::Error::from(VendorError::transform(format!(
            "Invalid regex pattern '{source}': {err}"
        )))
    })
}

/// Build a glob set matching `/`-separated relative paths
///
/// `*` never crosses a directory boundary; `**` does.
pub fn build_glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern.trim_start_matches("./"))
            .literal_separator(true)
            .build()
            .map_err(|err| {
                VendorError::configuration(format!("Invalid glob pattern '{pattern}': {err}"))
            })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| VendorError::configuration(format!("Invalid glob set: {err}")).into())
}

/// Include globs where a leading `!` excludes matching paths
#[derive(Debug, Clone)]
pub struct IncludeFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl IncludeFilter {
    /// Split `patterns` into positive and negated globs and compile both
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a glob does not compile.
    pub fn build(patterns: &[String]) -> Result<Self> {
        let (negated, positive): (Vec<&String>, Vec<&String>) = patterns
            .iter()
            .partition(|pattern| pattern.starts_with('!'));

        let positive: Vec<String> = positive.into_iter().cloned().collect();
        let negated: Vec<String> = negated
            .into_iter()
            .filter_map(|pattern| pattern.strip_prefix('!'))
            .map(str::to_owned)
            .collect();

        Ok(Self {
            include: build_glob_set(&positive)?,
            exclude: build_glob_set(&negated)?,
        })
    }

    /// A path is selected by a positive glob and no negated one
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}

/// Ready-to-run transform built from a [`TransformSpec`]
#[derive(Debug, Clone)]
pub struct CompiledTransform {
    name: String,
    filter: Option<GlobSet>,
    content: Vec<CompiledRule>,
    path: Vec<CompiledRule>,
}

impl CompiledTransform {
    /// Compile a spec, validating its globs and patterns
    ///
    /// # Errors
    ///
    /// Returns a transform error if a glob or regex does not compile.
    pub fn compile(spec: &TransformSpec, fallback_name: &str) -> Result<Self> {
        let name = spec
            .name
            .clone()
            .unwrap_or_else(|| fallback_name.to_owned());

        let filter = if spec.files.is_empty() {
            None
        } else {
            Some(build_glob_set(&spec.files).map_err(|err| {
                VendorError::transform(format!("Transform '{name}': {err}"))
            })?)
        };

        let compile_all = |rules: &[Rule]| -> Result<Vec<CompiledRule>> {
            rules
                .iter()
                .map(|rule| {
                    CompiledRule::compile(rule).map_err(|err| {
                        anyhow::Error::from(VendorError::transform(format!(
                            "Transform '{name}': {err}"
                        )))
                    })
                })
                .collect()
        };

        Ok(Self {
            content: compile_all(&spec.content)?,
            path: compile_all(&spec.path)?,
            filter,
            name,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the unit applies to the given target-relative path
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter.is_match(path))
    }
}

impl Transform for CompiledTransform {
    fn transform(&self, content: &str, path: &str) -> TransformOutcome {
        if !self.matches(path) {
            return TransformOutcome::unchanged();
        }

        let run = |rules: &[CompiledRule], input: &str| -> Option<String> {
            let output = rules
                .iter()
                .fold(input.to_owned(), |acc, rule| rule.apply(&acc));
            (output != input).then_some(output)
        };

        TransformOutcome {
            content: run(&self.content, content),
            path: run(&self.path, path),
        }
    }
}
