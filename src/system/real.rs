//! Real system implementation using `std::env`, `std::fs` and `ignore`

use super::{System, WalkEntry, WalkOptions};
use ignore::WalkBuilder;
use std::env::VarError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Production implementation of System trait
///
/// This implementation directly delegates to the standard library's
/// environment and filesystem functions. Directory walks go through
/// `ignore::WalkBuilder` so ignore files are honoured the way git does.
#[derive(Debug, Clone, Copy)]
pub struct RealSystem;

impl RealSystem {
    /// Create a new `RealSystem` instance
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for RealSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for RealSystem {
    fn env_var(&self, key: &str) -> Result<String, VarError> {
        std::env::var(key)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        fs::write(path, contents)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn walk_dir(&self, path: &Path, options: WalkOptions) -> io::Result<Vec<WalkEntry>> {
        let walker = WalkBuilder::new(path)
            .hidden(!options.hidden)
            .git_ignore(options.git_ignore)
            .git_exclude(options.git_ignore)
            .git_global(false)
            .ignore(options.git_ignore)
            .parents(options.git_ignore)
            .require_git(false)
            .follow_links(options.follow_links)
            .filter_entry(|entry| entry.file_name() != ".git")
            .sort_by_file_path(|a, b| a.cmp(b))
            .build();

        let mut entries = Vec::new();
        for result in walker {
            let entry = result.map_err(io::Error::other)?;
            if entry.depth() == 0 {
                continue;
            }
            let file_type = entry.file_type();
            entries.push(WalkEntry {
                path: entry.path().to_path_buf(),
                is_file: file_type.is_some_and(|ft| ft.is_file()),
                is_dir: file_type.is_some_and(|ft| ft.is_dir()),
            });
        }

        Ok(entries)
    }
}
