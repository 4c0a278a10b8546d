//! File system utilities

use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Create parent directories for a file path if they don't exist
pub fn create_parent_directories(system: &dyn System, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent()
        && !parent.as_os_str().is_empty()
        && !system.exists(parent)
    {
        system.create_dir_all(parent).with_context(|| {
            format!(
                "Failed to create parent directories for: {}",
                file_path.display()
            )
        })?;
    }
    Ok(())
}

/// Write a file, creating its parent directories first
pub fn write_file(system: &dyn System, file_path: &Path, contents: &str) -> Result<()> {
    create_parent_directories(system, file_path)?;
    system
        .write(file_path, contents.as_bytes())
        .with_context(|| format!("Failed to write file: {}", file_path.display()))
}

/// Check if directory is empty
pub fn is_directory_empty(system: &dyn System, dir_path: &Path) -> Result<bool> {
    if !system.is_dir(dir_path) {
        return Ok(false);
    }

    let entries = system
        .read_dir(dir_path)
        .with_context(|| format!("Failed to read directory: {}", dir_path.display()))?;

    Ok(entries.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::{MockSystem, RealSystem};
    use tempfile::TempDir;

    #[test]
    fn test_create_parent_directories() {
        let system = RealSystem::new();
        let temp_dir = TempDir::new().unwrap();
        let nested_file = temp_dir.path().join("a/b/c/file.txt");

        assert!(create_parent_directories(&system, &nested_file).is_ok());
        assert!(nested_file.parent().unwrap().exists());
    }

    #[test]
    fn test_write_file_creates_parents() {
        let system = MockSystem::new();
        let file = Path::new("/target/deep/nested/file.js");

        write_file(&system, file, "content").unwrap();
        assert_eq!(system.read_to_string(file).unwrap(), "content");
    }

    #[test]
    fn test_is_directory_empty() {
        let system = MockSystem::new()
            .with_dir("/empty")
            .unwrap()
            .with_file("/non_empty/file.txt", b"content")
            .unwrap();

        assert!(is_directory_empty(&system, Path::new("/empty")).unwrap());
        assert!(!is_directory_empty(&system, Path::new("/non_empty")).unwrap());
        assert!(!is_directory_empty(&system, Path::new("/missing")).unwrap());
    }
}
