//! Detaching a vendored file from management

use crate::config::Config;
use crate::error::VendorError;
use crate::operations::editor::{lock_key, update_readonly_files};
use crate::system::System;
use crate::utils::path::{normalize_path, relative_slash, to_slash};
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Strip the banner from a vendored file so future syncs leave it alone
///
/// `file` may be absolute, relative to the target root, or relative to the
/// working directory, tried in that order. Returns whether a banner was
/// removed; a file without a banner is left untouched.
///
/// # Errors
///
/// Returns a filesystem error if the file cannot be found, read or written.
pub fn eject(system: &dyn System, config: &Config, file: &str) -> Result<bool> {
    let path = resolve_file(system, config, file)?;

    let content = system
        .read_to_string(&path)
        .map_err(|err| VendorError::filesystem(format!("Failed to read {}: {err}", path.display())))?;

    let banner = config.banner();
    let Some(stripped) = banner.strip(&content, &to_slash(&path)) else {
        info!("{} carries no banner, nothing to eject", path.display());
        return Ok(false);
    };

    system
        .write(&path, stripped.as_bytes())
        .map_err(|err| VendorError::filesystem(format!("Failed to write {}: {err}", path.display())))?;
    info!("✓ Ejected {}", path.display());

    if let Some(settings) = config.editor_settings() {
        unlock(system, config, &settings, &path);
    }

    Ok(true)
}

fn resolve_file(system: &dyn System, config: &Config, file: &str) -> Result<PathBuf> {
    let requested = Path::new(file);
    let cwd = system
        .current_dir()
        .context("Failed to determine the current directory")?;

    let mut candidates = Vec::new();
    if requested.is_absolute() {
        candidates.push(requested.to_path_buf());
    } else {
        if let Some(target_root) = config.target_root() {
            candidates.push(cwd.join(target_root).join(requested));
        }
        candidates.push(cwd.join(requested));
    }

    candidates
        .into_iter()
        .map(|candidate| normalize_path(&candidate))
        .find(|candidate| system.is_file(candidate))
        .ok_or_else(|| VendorError::filesystem(format!("File to eject not found: {file}")).into())
}

fn unlock(system: &dyn System, config: &Config, settings: &Path, path: &Path) {
    let Some(target_root) = config.target_root() else {
        return;
    };
    let Ok(cwd) = system.current_dir() else {
        return;
    };
    let Some(relative) = relative_slash(&cwd.join(&target_root), path) else {
        return;
    };

    let key = lock_key(&target_root, &relative);
    if let Err(err) = update_readonly_files(system, &cwd.join(settings), &[key], &[]) {
        warn!("✗ Failed to update editor settings: {:#}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EditorLock, RemoveOptions, SourceConfig, TargetConfig};
    use crate::operations::banner::BannerStyle;
    use crate::operations::remove::remove_managed;
    use crate::system::MockSystem;

    fn config() -> Config {
        Config {
            source: SourceConfig {
                path: "source".to_owned(),
                ..SourceConfig::default()
            },
            target: TargetConfig {
                path: Some("target".to_owned()),
                includes: vec!["**/*".to_owned()],
                ..TargetConfig::default()
            },
        }
    }

    #[test]
    fn eject_strips_exactly_the_banner() {
        let content = format!("{}console.log(1);", BannerStyle::Block.text());
        let system = MockSystem::new()
            .with_current_dir("/project")
            .unwrap()
            .with_file("/project/target/index.js", content.as_bytes())
            .unwrap();

        assert!(eject(&system, &config(), "index.js").unwrap());
        assert_eq!(
            system
                .read_to_string(Path::new("/project/target/index.js"))
                .unwrap(),
            "console.log(1);"
        );
    }

    #[test]
    fn ejected_file_survives_removal_when_tag_came_from_a_transform() {
        let system = MockSystem::new()
            .with_current_dir("/project")
            .unwrap()
            .with_file("/project/target/index.js", b"// @vendorism\n\nconsole.log(1);")
            .unwrap();

        assert!(eject(&system, &config(), "index.js").unwrap());

        let removed = remove_managed(
            &system,
            Path::new("/project/target"),
            &RemoveOptions::default(),
        )
        .unwrap();
        assert!(removed.is_empty());
        assert_eq!(
            system
                .read_to_string(Path::new("/project/target/index.js"))
                .unwrap(),
            "\nconsole.log(1);"
        );
    }

    #[test]
    fn eject_without_banner_does_nothing() {
        let system = MockSystem::new()
            .with_current_dir("/project")
            .unwrap()
            .with_file("/project/notes.js", b"console.log(1);")
            .unwrap();

        assert!(!eject(&system, &config(), "notes.js").unwrap());
        assert!(!eject(&system, &config(), "/project/notes.js").unwrap());
    }

    #[test]
    fn eject_missing_file_fails() {
        let system = MockSystem::new().with_current_dir("/project").unwrap();
        let err = eject(&system, &config(), "missing.js").unwrap_err();
        assert_eq!(err.downcast_ref::<VendorError>().unwrap().exit_code(), 6);
    }

    #[test]
    fn eject_uses_the_override_banner() {
        let mut config = config();
        config.target.banner = Some("// @vendorism custom\n".to_owned());
        let system = MockSystem::new()
            .with_current_dir("/project")
            .unwrap()
            .with_file("/project/target/a.py", b"// @vendorism custom\nprint(1)\n")
            .unwrap();

        assert!(eject(&system, &config, "target/a.py").unwrap());
        assert_eq!(
            system
                .read_to_string(Path::new("/project/target/a.py"))
                .unwrap(),
            "print(1)\n"
        );
    }

    #[test]
    fn eject_unlocks_the_file() {
        let mut config = config();
        config.target.lock_files_for_vs_code = Some(EditorLock::Enabled(true));
        let content = format!("{}x", BannerStyle::Block.text());
        let system = MockSystem::new()
            .with_current_dir("/project")
            .unwrap()
            .with_file("/project/target/lib/a.js", content.as_bytes())
            .unwrap()
            .with_file(
                "/project/.vscode/settings.json",
                br#"{"files.readonlyInclude": {"target/lib/a.js": true, "target/b.js": true}}"#,
            )
            .unwrap();

        assert!(eject(&system, &config, "lib/a.js").unwrap());

        let settings = system
            .read_to_string(Path::new("/project/.vscode/settings.json"))
            .unwrap();
        assert!(!settings.contains("target/lib/a.js"));
        assert!(settings.contains("target/b.js"));
    }
}
