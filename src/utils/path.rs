//! Path manipulation and validation utilities

use crate::error::VendorError;
use anyhow::Result;
use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {
                // Skip '.' components
            }
            Component::ParentDir => {
                // Pop the last normal component, keep leading '..'
                match components.last() {
                    Some(Component::Normal(_)) => {
                        components.pop();
                    }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    _ => components.push(component),
                }
            }
            _ => {
                components.push(component);
            }
        }
    }

    components.iter().collect()
}

/// Render a path with `/` separators regardless of host OS
#[must_use]
pub fn to_slash(path: &Path) -> String {
    let rendered = path
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_owned()),
            Component::RootDir | Component::Prefix(_) | Component::CurDir => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    if path.has_root() {
        format!("/{rendered}")
    } else {
        rendered
    }
}

/// Path of `path` relative to `root`, `/`-separated
///
/// Returns `None` when `path` is not located under `root`.
#[must_use]
pub fn relative_slash(root: &Path, path: &Path) -> Option<String> {
    let root = normalize_path(root);
    let path = normalize_path(path);
    path.strip_prefix(&root).ok().map(to_slash)
}

/// Join a `/`-separated relative path onto a root directory
#[must_use]
pub fn join_slash(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Validate that a relative path stays inside its root
///
/// # Errors
///
/// Returns an error if:
/// - The path is empty
/// - The path is absolute
/// - The path escapes its root through `..` components
pub fn validate_relative_path(path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(VendorError::configuration("Path cannot be empty").into());
    }

    let path_obj = Path::new(path);
    if path_obj.has_root() || path.starts_with('/') {
        return Err(VendorError::configuration(format!(
            "Absolute paths are not allowed here: '{path}'"
        ))
        .into());
    }

    let normalized = normalize_path(path_obj);
    if matches!(normalized.components().next(), Some(Component::ParentDir)) {
        return Err(VendorError::configuration(format!(
            "Path contains unsafe directory traversal: '{path}' -> '{}'",
            to_slash(&normalized)
        ))
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("a/./b/../c")),
            PathBuf::from("a/c")
        );
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_path(Path::new("/a/../..")), PathBuf::from("/"));
    }

    #[test]
    fn test_relative_slash() {
        assert_eq!(
            relative_slash(Path::new("/src"), Path::new("/src/lib/util.js")),
            Some("lib/util.js".to_owned())
        );
        assert_eq!(
            relative_slash(Path::new("./src"), Path::new("src/./index.js")),
            Some("index.js".to_owned())
        );
        assert_eq!(relative_slash(Path::new("/src"), Path::new("/other/a.js")), None);
    }

    #[test]
    fn test_join_slash() {
        assert_eq!(
            join_slash(Path::new("/target"), "sub/dir/file.js"),
            Path::new("/target").join("sub").join("dir").join("file.js")
        );
        assert_eq!(
            join_slash(Path::new("target"), "./file.js"),
            Path::new("target").join("file.js")
        );
    }

    #[test]
    fn test_validate_relative_path() {
        assert!(validate_relative_path("lib/index.js").is_ok());
        assert!(validate_relative_path("lib/../index.js").is_ok());
        assert!(validate_relative_path("../escape.js").is_err());
        assert!(validate_relative_path("lib/../../escape.js").is_err());
        assert!(validate_relative_path("/etc/passwd").is_err());
        assert!(validate_relative_path("").is_err());
    }
}
