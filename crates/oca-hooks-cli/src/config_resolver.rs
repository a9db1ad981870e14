//! Configuration file resolution with global fallback.
//!
//! Resolves the configuration file path using a deterministic priority order:
//!
//! 1. `--config` flag (explicit path)
//! 2. `.oca_hooks.toml` in the current directory
//! 3. `.oca_hooks.toml` at the repository root (nearest ancestor with `.git`)
//! 4. `~/.oca_hooks.toml` (global fallback)
//! 5. No config found → the file source specifies nothing

use oca_hooks_core::CONFIG_FILE_NAME;
use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found in the current directory.
    Current(PathBuf),
    /// Found at the repository root.
    Repository(PathBuf),
    /// Loaded from the global config directory.
    Global(PathBuf),
    /// No config found.
    Default,
}

impl ConfigLocation {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Current(p) | Self::Repository(p) | Self::Global(p) => {
                Some(p)
            }
            Self::Default => None,
        }
    }

    /// Returns `true` if the path was given on the command line.
    #[must_use]
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::Explicit(_))
    }
}

/// Resolves the configuration file path.
///
/// See module-level docs for resolution order.
#[must_use]
pub fn resolve(current_dir: &Path, explicit: Option<&Path>) -> ConfigLocation {
    resolve_inner(current_dir, explicit, global_config_dir())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn resolve_inner(
    current_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigLocation {
    if let Some(p) = explicit {
        return ConfigLocation::Explicit(p.to_path_buf());
    }

    let candidate = current_dir.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        tracing::debug!("Found config in current directory: {}", candidate.display());
        return ConfigLocation::Current(candidate);
    }

    if let Some(repo) = repository_root(current_dir) {
        let candidate = repo.join(CONFIG_FILE_NAME);
        if repo != current_dir && candidate.is_file() {
            tracing::debug!("Found repository config: {}", candidate.display());
            return ConfigLocation::Repository(candidate);
        }
    }

    if let Some(dir) = global_dir {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!("Found global config: {}", candidate.display());
            return ConfigLocation::Global(candidate);
        }
    }

    ConfigLocation::Default
}

/// Nearest ancestor of `dir` (itself included) holding a `.git` entry.
fn repository_root(dir: &Path) -> Option<&Path> {
    dir.ancestors().find(|d| d.join(".git").exists())
}

/// Returns the global config directory path.
///
/// Resolution: `$OCA_HOOKS_CONFIG_DIR` > home directory
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("OCA_HOOKS_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn explicit_takes_priority_over_everything() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();
        let explicit = tmp.path().join("custom.toml");

        let result = resolve_inner(tmp.path(), Some(&explicit), None);
        assert_eq!(result, ConfigLocation::Explicit(explicit));
        assert!(result.is_explicit());
    }

    #[test]
    fn current_directory_before_repository_root() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();
        let sub = tmp.path().join("addons");
        fs::create_dir(&sub).unwrap();

        let result = resolve_inner(&sub, None, None);
        assert_eq!(
            result,
            ConfigLocation::Repository(tmp.path().join(CONFIG_FILE_NAME))
        );

        fs::write(sub.join(CONFIG_FILE_NAME), "").unwrap();
        let result = resolve_inner(&sub, None, None);
        assert_eq!(result, ConfigLocation::Current(sub.join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn repository_without_config_falls_back_to_global() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join(CONFIG_FILE_NAME), "").unwrap();

        let result = resolve_inner(tmp.path(), None, Some(global.path().to_path_buf()));
        assert_eq!(
            result,
            ConfigLocation::Global(global.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn no_config_anywhere_returns_default() {
        let tmp = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let result = resolve_inner(tmp.path(), None, Some(global.path().to_path_buf()));
        assert_eq!(result, ConfigLocation::Default);
        assert!(result.path().is_none());
    }
}
