//! Source acquisition: populate the source path from a local or git location

use crate::config::{Config, DownloadConfig, SourceConfig};
use crate::error::VendorError;
use crate::operations::hooks::{HookStage, run_hook};
use crate::system::{System, WalkOptions};
use crate::utils::fs::{create_parent_directories, is_directory_empty};
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// URL suffixes of archives, which are not fetched directly
const ARCHIVE_SUFFIXES: [&str; 7] = [".zip", ".tar", ".tar.gz", ".tgz", ".tar.bz2", ".tar.xz", ".7z"];

/// Where the source tree comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Local directory given as `file:` or `file://`
    Local(PathBuf),
    /// Git repository URL suitable for `git clone`
    Git(String),
}

impl SourceLocation {
    /// Parse a source URL
    ///
    /// # Errors
    ///
    /// Returns a source error for archive URLs and unsupported formats.
    pub fn parse(system: &dyn System, url: &str) -> Result<Self> {
        let lowered = url.to_ascii_lowercase();
        if ARCHIVE_SUFFIXES.iter().any(|suffix| lowered.ends_with(suffix)) {
            return Err(VendorError::from_source(format!(
                "Archive sources are not supported: '{url}'\n\
                Use a source hook to download and extract archives"
            ))
            .into());
        }

        if let Some(path) = url.strip_prefix("file://").or_else(|| url.strip_prefix("file:")) {
            return Ok(Self::Local(expand_home(system, path)?));
        }

        normalize_repository_url(url).map(Self::Git)
    }
}

fn expand_home(system: &dyn System, path: &str) -> Result<PathBuf> {
    let Some(rest) = path.strip_prefix('~') else {
        return Ok(PathBuf::from(path));
    };

    let home = system
        .env_var("HOME")
        .map(PathBuf::from)
        .ok()
        .or_else(dirs::home_dir)
        .ok_or_else(|| {
            VendorError::configuration("Cannot determine home directory for ~ expansion")
        })?;

    Ok(home.join(rest.trim_start_matches(['/', '\\'])))
}

/// Normalize a repository URL to a format suitable for Git operations
fn normalize_repository_url(url: &str) -> Result<String> {
    if url.starts_with("https://") || url.starts_with("http://") {
        if url.ends_with(".git") {
            return Ok(url.to_owned());
        }
        return Ok(format!("{url}.git"));
    }

    if url.starts_with("git@") || url.starts_with("ssh://") {
        return Ok(url.to_owned());
    }

    if url.contains('/') && !url.contains(':') && url.matches('/').count() == 1 {
        return Ok(format!("https://github.com/{url}.git"));
    }

    Err(VendorError::from_source(format!(
        "Unsupported source URL format: '{url}'\n\
        Supported formats:\n\
        - Short: myorg/repo\n\
        - HTTPS: https://github.com/myorg/repo.git\n\
        - SSH: git@github.com:myorg/repo.git\n\
        - Local: file:///path/to/dir or file:~/path/to/dir"
    ))
    .into())
}

/// Run the source hooks and fetch the source tree if a URL is configured
///
/// # Errors
///
/// Returns an error if a hook fails or the source cannot be fetched.
pub fn fetch_source(system: &dyn System, config: &Config) -> Result<()> {
    let source = &config.source;
    run_hook(source.hooks.as_ref(), HookStage::Before)?;

    if let Some(url) = source.url.as_deref() {
        let location = SourceLocation::parse(system, url)?;
        let copied = populate(system, source, &location)?;
        info!("✓ Fetched {} file(s) into {}", copied, source.path);
    } else {
        debug!("No source URL configured, using {} as is", source.path);
    }

    run_hook(source.hooks.as_ref(), HookStage::After)
}

fn populate(system: &dyn System, source: &SourceConfig, location: &SourceLocation) -> Result<usize> {
    let destination = Path::new(&source.path);
    let download = source.download.clone().unwrap_or_default();

    if download.clean && system.exists(destination) {
        debug!("Cleaning {}", destination.display());
        system
            .remove_dir_all(destination)
            .with_context(|| format!("Failed to clean {}", destination.display()))?;
    } else if system.is_dir(destination) && !is_directory_empty(system, destination)? {
        warn!(
            "{} is not empty; files removed upstream will linger unless download.clean is set",
            destination.display()
        );
    }

    match location {
        SourceLocation::Local(path) => {
            let from = match download.subdirectory.as_deref() {
                Some(subdirectory) => path.join(subdirectory),
                None => path.clone(),
            };
            copy_tree(system, &from, destination)
        }
        SourceLocation::Git(url) => {
            let checkout = GitCheckout::new(url, &download)?;
            let checked_out = checkout.execute()?;
            copy_tree(system, &checked_out, destination)
        }
    }
}

/// Copy every file under `from` into `to`, skipping `.git`
///
/// # Errors
///
/// Returns a source error if `from` is not a directory, and an error if a
/// file cannot be copied.
pub fn copy_tree(system: &dyn System, from: &Path, to: &Path) -> Result<usize> {
    if !system.is_dir(from) {
        return Err(VendorError::from_source(format!(
            "Source directory does not exist: {}",
            from.display()
        ))
        .into());
    }

    let entries = system
        .walk_dir(from, WalkOptions::everything())
        .with_context(|| format!("Failed to walk {}", from.display()))?;

    let mut copied = 0;
    for entry in entries.iter().filter(|entry| entry.is_file) {
        let Ok(relative) = entry.path.strip_prefix(from) else {
            continue;
        };
        let destination = to.join(relative);
        create_parent_directories(system, &destination)?;
        system.copy(&entry.path, &destination).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                entry.path.display(),
                destination.display()
            )
        })?;
        copied += 1;
    }

    Ok(copied)
}

/// Blob-less clone with optional sparse checkout of one subdirectory
struct GitCheckout {
    url: String,
    reference: Option<String>,
    subdirectory: Option<String>,
    temp_dir: TempDir,
}

impl GitCheckout {
    fn new(url: &str, download: &DownloadConfig) -> Result<Self> {
        let temp_dir =
            TempDir::new().context("Failed to create temporary directory for Git operations")?;

        Ok(Self {
            url: url.to_owned(),
            reference: download.git_ref.clone(),
            subdirectory: download.subdirectory.clone(),
            temp_dir,
        })
    }

    /// Clone, restrict and check out; returns the directory to copy from
    fn execute(&self) -> Result<PathBuf> {
        let repo_path = self.temp_dir.path();
        debug!("Cloning {} into {}", self.url, repo_path.display());

        let mut clone = Command::new("git");
        clone
            .args(["clone", "--filter=blob:none", "--no-checkout", self.url.as_str()])
            .arg(repo_path);
        run_git(clone, &format!("clone repository '{}'", self.url))?;

        if let Some(subdirectory) = self.subdirectory.as_deref() {
            let mut init = Command::new("git");
            init.args(["sparse-checkout", "init", "--cone"])
                .current_dir(repo_path);
            run_git(init, "initialize sparse checkout")?;

            let mut set = Command::new("git");
            set.args(["sparse-checkout", "set", subdirectory])
                .current_dir(repo_path);
            run_git(set, "set sparse checkout patterns")?;
        }

        let reference = match self.reference.clone() {
            Some(reference) => reference,
            None => {
                let mut head = Command::new("git");
                head.args(["rev-parse", "--abbrev-ref", "HEAD"])
                    .current_dir(repo_path);
                run_git(head, "resolve the default branch")?
            }
        };

        let mut checkout = Command::new("git");
        checkout.args(["checkout", reference.as_str()]).current_dir(repo_path);
        run_git(checkout, &format!("check out reference '{reference}'"))?;

        let result = match self.subdirectory.as_deref() {
            Some(subdirectory) => repo_path.join(subdirectory),
            None => repo_path.to_path_buf(),
        };
        debug!("Checked out {} at {}", reference, result.display());
        Ok(result)
    }
}

/// Run a git command, returning its trimmed stdout
fn run_git(mut command: Command, action: &str) -> Result<String> {
    let output = command
        .output()
        .with_context(|| format!("Failed to execute git to {action}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VendorError::from_source(format!(
            "Failed to {action}: {}",
            stderr.trim()
        ))
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn parses_supported_urls() {
        let system = MockSystem::new().with_env("HOME", "/home/user").unwrap();

        assert_eq!(
            SourceLocation::parse(&system, "acme/widgets").unwrap(),
            SourceLocation::Git("https://github.com/acme/widgets.git".to_owned())
        );
        assert_eq!(
            SourceLocation::parse(&system, "https://example.com/acme/widgets").unwrap(),
            SourceLocation::Git("https://example.com/acme/widgets.git".to_owned())
        );
        assert_eq!(
            SourceLocation::parse(&system, "git@github.com:acme/widgets.git").unwrap(),
            SourceLocation::Git("git@github.com:acme/widgets.git".to_owned())
        );
        assert_eq!(
            SourceLocation::parse(&system, "file:///opt/widgets").unwrap(),
            SourceLocation::Local(PathBuf::from("/opt/widgets"))
        );
        assert_eq!(
            SourceLocation::parse(&system, "file:~/widgets").unwrap(),
            SourceLocation::Local(PathBuf::from("/home/user/widgets"))
        );
    }

    #[test]
    fn rejects_archives_and_unknown_formats() {
        let system = MockSystem::new();

        let archive = SourceLocation::parse(&system, "https://example.com/pkg.tar.gz").unwrap_err();
        assert_eq!(archive.downcast_ref::<VendorError>().unwrap().exit_code(), 2);

        assert!(SourceLocation::parse(&system, "not a url").is_err());
        assert!(SourceLocation::parse(&system, "a/b/c").is_err());
    }

    #[test]
    fn copies_local_sources_without_git_metadata() {
        let system = MockSystem::new()
            .with_file("/upstream/index.js", b"index")
            .unwrap()
            .with_file("/upstream/lib/util.js", b"util")
            .unwrap()
            .with_file("/upstream/.git/HEAD", b"ref")
            .unwrap();
        let config = Config {
            source: SourceConfig {
                path: "/vendor/source".to_owned(),
                url: Some("file:///upstream".to_owned()),
                ..SourceConfig::default()
            },
            ..Config::default()
        };

        fetch_source(&system, &config).unwrap();

        assert_eq!(
            system
                .read_to_string(Path::new("/vendor/source/lib/util.js"))
                .unwrap(),
            "util"
        );
        assert!(system.exists(Path::new("/vendor/source/index.js")));
        assert!(!system.exists(Path::new("/vendor/source/.git/HEAD")));
    }

    #[test]
    fn clean_empties_the_source_first() {
        let system = MockSystem::new()
            .with_file("/upstream/sub/a.js", b"a")
            .unwrap()
            .with_file("/vendor/source/stale.js", b"stale")
            .unwrap();
        let config = Config {
            source: SourceConfig {
                path: "/vendor/source".to_owned(),
                url: Some("file:/upstream".to_owned()),
                download: Some(DownloadConfig {
                    subdirectory: Some("sub".to_owned()),
                    clean: true,
                    ..DownloadConfig::default()
                }),
                ..SourceConfig::default()
            },
            ..Config::default()
        };

        fetch_source(&system, &config).unwrap();

        assert!(system.exists(Path::new("/vendor/source/a.js")));
        assert!(!system.exists(Path::new("/vendor/source/stale.js")));
    }

    #[test]
    fn missing_local_source_is_a_source_error() {
        let system = MockSystem::new();
        let err = copy_tree(&system, Path::new("/missing"), Path::new("/dest")).unwrap_err();
        assert_eq!(err.downcast_ref::<VendorError>().unwrap().exit_code(), 2);
    }
}
