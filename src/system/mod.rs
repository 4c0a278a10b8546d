//! System abstraction for environment and filesystem operations
//!
//! This module provides a unified trait for all external system interactions,
//! allowing for easy testing with mock implementations.

use std::env::VarError;
use std::io;
use std::path::{Path, PathBuf};

pub mod mock;
pub mod real;

pub use mock::MockSystem;
pub use real::RealSystem;

/// Entry from directory walking
#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub is_file: bool,
    pub is_dir: bool,
}

/// Options controlling a recursive directory walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalkOptions {
    /// Honour `.gitignore`, `.ignore` and git exclude files
    pub git_ignore: bool,
    /// Include dot-files and dot-directories
    pub hidden: bool,
    /// Follow symbolic links
    pub follow_links: bool,
}

impl Default for WalkOptions {
    #[inline]
    fn default() -> Self {
        Self {
            git_ignore: true,
            hidden: true,
            follow_links: false,
        }
    }
}

impl WalkOptions {
    /// Walk every file, ignoring nothing but `.git`
    #[must_use]
    #[inline]
    pub const fn everything() -> Self {
        Self {
            git_ignore: false,
            hidden: true,
            follow_links: false,
        }
    }
}

/// Unified trait for system operations (environment + filesystem)
///
/// This trait abstracts all interactions with the operating system,
/// including environment variables and filesystem operations.
///
/// # Implementations
/// - `RealSystem`: Production implementation using `std::env`, `std::fs` and `ignore`
/// - `MockSystem`: Test implementation using in-memory storage
pub trait System: Send + Sync {
    // ==================== Environment Operations ====================

    /// Get an environment variable
    fn env_var(&self, key: &str) -> Result<String, VarError>;

    /// Get the current working directory
    fn current_dir(&self) -> io::Result<PathBuf>;

    // ==================== Filesystem Operations ====================

    /// Read entire file contents as a string
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write bytes to a file, creating it if it doesn't exist
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Recursively create a directory and all parent directories
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove an empty directory
    ///
    /// Fails if the directory still has entries; callers rely on this to
    /// know when to stop pruning.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and all its contents
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a file
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Copy a file from source to destination
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if a path points to a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if a path points to a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Read directory entries, returning paths of all entries
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Recursively walk a directory, returning all entries sorted by path
    ///
    /// The root itself is excluded and `.git` directories are never entered.
    ///
    /// # Note
    /// For `RealSystem`, ignore files are honoured through the `ignore` crate.
    /// For `MockSystem`, only the `hidden` option is honoured.
    fn walk_dir(&self, path: &Path, options: WalkOptions) -> io::Result<Vec<WalkEntry>>;
}
