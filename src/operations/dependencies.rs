//! Static dependency resolution for included source files
//!
//! Scans script and stylesheet sources for relative import specifiers and
//! follows them transitively. Package imports and type-only imports are
//! never followed.

use crate::error::VendorError;
use crate::system::System;
use crate::utils::path::{join_slash, normalize_path, to_slash};
use anyhow::Result;
use regex::Regex;
use std::collections::HashSet;
use std::path::{Component, Path};
use tracing::{debug, warn};

/// Extensions tried, in order, when a specifier omits one
pub const RESOLVE_EXTENSIONS: [&str; 9] = [
    ".js", ".mjs", ".cjs", ".jsx", ".ts", ".tsx", ".json", ".css", ".scss",
];

/// Extensions whose content is scanned for further imports
const SCANNABLE_EXTENSIONS: [&str; 8] = ["js", "mjs", "cjs", "jsx", "ts", "tsx", "css", "scss"];

/// Regex-based import scanner
pub struct ImportScanner {
    patterns: Vec<Regex>,
}

impl ImportScanner {
    /// Compile the import patterns
    ///
    /// Every pattern captures an optional `type` keyword and the specifier.
    pub fn new() -> Result<Self> {
        let sources = [
            // import x from '...', import { a, b } from '...', import type { T } from '...'
            r#"\bimport\s+(?P<kind>type\s+)?[\w*${}\s,]+?\s*\bfrom\s*['"](?P<spec>[^'"\n]+)['"]"#,
            // export * from '...', export { a } from '...', export type { T } from '...'
            r#"\bexport\s+(?P<kind>type\s+)?(?:\*(?:\s+as\s+[\w$]+)?|\{[^}]*\})\s*from\s*['"](?P<spec>[^'"\n]+)['"]"#,
            // import '...'
            r#"\bimport\s*['"](?P<spec>[^'"\n]+)['"]"#,
            // import('...')
            r#"\bimport\s*\(\s*['"](?P<spec>[^'"\n]+)['"]\s*\)"#,
            // require('...')
            r#"\brequire\s*\(\s*['"](?P<spec>[^'"\n]+)['"]\s*\)"#,
            // @import '...', @import url('...')
            r#"@import\s+(?:url\(\s*)?['"](?P<spec>[^'"\n]+)['"]"#,
        ];

        let patterns = sources
            .iter()
            .map(|source| {
                Regex::new(source).map_err(|err| {
                    anyhow::Error::from(VendorError::dependency(format!(
                        "Invalid import pattern: {err}"
                    )))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Specifiers imported by `content`, excluding type-only imports
    #[must_use]
    pub fn specifiers(&self, content: &str) -> Vec<String> {
        let mut found = Vec::new();
        for pattern in &self.patterns {
            for captures in pattern.captures_iter(content) {
                if captures.name("kind").is_some() {
                    continue;
                }
                if let Some(spec) = captures.name("spec") {
                    found.push(spec.as_str().to_owned());
                }
            }
        }
        found
    }
}

/// Compute the transitive closure of local dependencies of `included`
///
/// Paths in and out are relative to `source_root` with `/` separators. The
/// result keeps discovery order, starts with the included files themselves,
/// and contains no duplicates.
///
/// # Errors
///
/// Returns a dependency error if a scannable file cannot be read.
pub fn resolve_dependencies(
    system: &dyn System,
    source_root: &Path,
    included: &[String],
) -> Result<Vec<String>> {
    let scanner = ImportScanner::new()?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut ordered = Vec::new();
    let mut stack: Vec<String> = included.iter().rev().cloned().collect();

    while let Some(relative) = stack.pop() {
        if !seen.insert(relative.clone()) {
            continue;
        }
        ordered.push(relative.clone());

        if !is_scannable(&relative) {
            continue;
        }

        let absolute = join_slash(source_root, &relative);
        let content = system.read_to_string(&absolute).map_err(|err| {
            VendorError::dependency(format!(
                "Failed to read {} while resolving dependencies: {err}",
                absolute.display()
            ))
        })?;

        let mut discovered = Vec::new();
        for specifier in scanner.specifiers(&content) {
            if !is_relative_specifier(&specifier)
                || specifier.ends_with(".d.ts")
                || specifier.split('/').any(|part| part == "node_modules")
            {
                continue;
            }
            match resolve_specifier(system, source_root, &relative, &specifier) {
                Some(resolved) => {
                    debug!("{} depends on {}", relative, resolved);
                    discovered.push(resolved);
                }
                None => warn!(
                    "Could not resolve '{}' imported from {}, skipping",
                    specifier, relative
                ),
            }
        }

        // Depth-first, preserving the order imports appear in
        stack.extend(discovered.into_iter().rev());
    }

    Ok(ordered)
}

fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

fn is_scannable(relative: &str) -> bool {
    !relative.ends_with(".d.ts")
        && Path::new(relative)
            .extension()
            .is_some_and(|ext| SCANNABLE_EXTENSIONS.contains(&ext.to_string_lossy().as_ref()))
}

/// Resolve a relative specifier to a source-relative file path
fn resolve_specifier(
    system: &dyn System,
    source_root: &Path,
    importer: &str,
    specifier: &str,
) -> Option<String> {
    // Strip query strings and fragments used by bundlers
    let specifier = specifier
        .split(['?', '#'])
        .next()
        .unwrap_or(specifier);

    let importer_dir = Path::new(importer).parent().unwrap_or_else(|| Path::new(""));
    let joined = normalize_path(&importer_dir.join(specifier));

    if matches!(joined.components().next(), Some(Component::ParentDir)) {
        debug!("Ignoring '{}' from {}: outside the source root", specifier, importer);
        return None;
    }

    let base = to_slash(&joined);
    if base.split('/').any(|part| part == "node_modules") {
        return None;
    }

    let mut candidates = vec![base.clone()];
    candidates.extend(RESOLVE_EXTENSIONS.iter().map(|ext| format!("{base}{ext}")));
    candidates.extend(
        RESOLVE_EXTENSIONS
            .iter()
            .map(|ext| format!("{base}/index{ext}")),
    );
    candidates.extend(typescript_siblings(&base));

    candidates
        .into_iter()
        .filter(|candidate| !candidate.is_empty())
        .find(|candidate| system.is_file(&join_slash(source_root, candidate)))
        .filter(|resolved| !resolved.ends_with(".d.ts"))
}

/// TypeScript sources imported under their emitted name (`./foo.js` for `foo.ts`)
fn typescript_siblings(base: &str) -> Vec<String> {
    let swaps: [(&str, &[&str]); 4] = [
        (".js", &[".ts", ".tsx"]),
        (".jsx", &[".tsx"]),
        (".mjs", &[".mts"]),
        (".cjs", &[".cts"]),
    ];

    swaps
        .iter()
        .find_map(|(emitted, sources)| {
            base.strip_suffix(emitted).map(|stem| {
                sources
                    .iter()
                    .map(|source| format!("{stem}{source}"))
                    .collect()
            })
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn scanner_finds_every_import_form() {
        let scanner = ImportScanner::new().unwrap();
        let content = r#"
import a from './a.js';
import { b,
  c } from "./bc";
import * as d from './d';
import './side-effect.css';
import type { T } from './types';
export { e } from './e';
export * from './f';
export type { U } from './u';
const g = require('./g');
const h = await import('./h');
@import url("./theme.css");
import pkg from 'some-package';
"#;

        let mut found = scanner.specifiers(content);
        found.sort();
        assert_eq!(
            found,
            vec![
                "./a.js",
                "./bc",
                "./d",
                "./e",
                "./f",
                "./g",
                "./h",
                "./side-effect.css",
                "./theme.css",
                "some-package",
            ]
        );
    }

    #[test]
    fn emitted_js_specifiers_resolve_to_typescript_sources() {
        let system = MockSystem::new()
            .with_file("/src/main.ts", b"import { a } from './a.js';\nimport B from './b.jsx';")
            .unwrap()
            .with_file("/src/a.ts", b"export const a = 1;")
            .unwrap()
            .with_file("/src/b.tsx", b"export default 1;")
            .unwrap();

        let deps =
            resolve_dependencies(&system, Path::new("/src"), &["main.ts".to_owned()]).unwrap();
        assert_eq!(deps, vec!["main.ts", "a.ts", "b.tsx"]);
    }

    #[test]
    fn resolves_transitive_relative_dependencies() {
        let system = MockSystem::new()
            .with_file("/src/index.js", b"const dep = require('./dependency.js');")
            .unwrap()
            .with_file("/src/dependency.js", b"import { x } from './lib';")
            .unwrap()
            .with_file("/src/lib/index.ts", b"export const x = 1;")
            .unwrap()
            .with_file("/src/unused.js", b"")
            .unwrap();

        let deps =
            resolve_dependencies(&system, Path::new("/src"), &["index.js".to_owned()]).unwrap();
        assert_eq!(deps, vec!["index.js", "dependency.js", "lib/index.ts"]);
    }

    #[test]
    fn skips_packages_declarations_and_unresolved() {
        let system = MockSystem::new()
            .with_file(
                "/src/index.js",
                b"import React from 'react';\nimport './node_modules/x/y.js';\nimport './missing';\nimport './types.d.ts';\n",
            )
            .unwrap()
            .with_file("/src/node_modules/x/y.js", b"")
            .unwrap()
            .with_file("/src/types.d.ts", b"")
            .unwrap();

        let deps =
            resolve_dependencies(&system, Path::new("/src"), &["index.js".to_owned()]).unwrap();
        assert_eq!(deps, vec!["index.js"]);
    }

    #[test]
    fn skips_imports_outside_the_source_root() {
        let system = MockSystem::new()
            .with_file("/src/index.js", b"import '../outside.js';")
            .unwrap()
            .with_file("/outside.js", b"")
            .unwrap();

        let deps =
            resolve_dependencies(&system, Path::new("/src"), &["index.js".to_owned()]).unwrap();
        assert_eq!(deps, vec!["index.js"]);
    }

    #[test]
    fn handles_cycles() {
        let system = MockSystem::new()
            .with_file("/src/a.js", b"import './b.js';")
            .unwrap()
            .with_file("/src/b.js", b"import './a.js';")
            .unwrap();

        let deps = resolve_dependencies(&system, Path::new("/src"), &["a.js".to_owned()]).unwrap();
        assert_eq!(deps, vec!["a.js", "b.js"]);
    }

    #[test]
    fn unreadable_file_fails_resolution() {
        let system = MockSystem::new();
        let err = resolve_dependencies(&system, Path::new("/src"), &["gone.js".to_owned()])
            .unwrap_err();
        assert_eq!(err.downcast_ref::<VendorError>().unwrap().exit_code(), 4);
    }

    #[test]
    fn non_script_files_are_kept_but_not_scanned() {
        let system = MockSystem::new();
        let deps =
            resolve_dependencies(&system, Path::new("/src"), &["README.md".to_owned()]).unwrap();
        assert_eq!(deps, vec!["README.md"]);
    }
}
