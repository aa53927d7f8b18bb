//! Default locations and file names used across commands.

use std::path::{Path, PathBuf};

/// Properties file read when `--properties` is not given.
pub const PROPERTIES_FILE: &str = "gradle.properties";

/// Task assumed when `build` is invoked without `--task`.
pub const DEFAULT_TASK: &str = "build";

/// Returns the default mirror root, under which each remote repository has a
/// Maven-layout directory populated by the external fetcher.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/mod-composer/mirrors` (XDG Base Directory)
/// - macOS: `~/Library/Caches/mod-composer/mirrors`
/// - Windows: `{FOLDERID_LocalAppData}\mod-composer\mirrors`
///
/// Falls back to `.mod-composer-cache` in the current directory if the
/// platform cache directory cannot be determined. Overridden by
/// `--mirror-root` or the `MOD_COMPOSER_MIRRORS` environment variable.
pub fn default_mirror_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".mod-composer-cache"))
        .join("mod-composer")
        .join("mirrors")
}

/// Returns the project artifact cache directory, `<project>/.mod-composer/cache`.
pub fn default_cache_root(project_dir: &Path) -> PathBuf {
    project_dir.join(".mod-composer").join("cache")
}
