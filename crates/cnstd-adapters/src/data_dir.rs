//! Data directory resolution.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use cnstd_core::MODEL_VERSION;
use tracing::debug;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "CNSTD_HOME";

/// Older variable shared with the recognizer, still honoured.
pub const LEGACY_HOME_ENV: &str = "CNOCR_HOME";

static MODELS_DIR_OVERRIDE: RwLock<Option<PathBuf>> = RwLock::new(None);

/// Platform default data directory.
///
/// `%APPDATA%\cnstd` on Windows, `~/.cnstd` elsewhere.
#[must_use]
pub fn data_dir_default() -> PathBuf {
    #[cfg(windows)]
    let base = dirs::data_dir();
    #[cfg(not(windows))]
    let base = dirs::home_dir();

    let base = base.unwrap_or_else(|| PathBuf::from("."));
    if cfg!(windows) {
        base.join("cnstd")
    } else {
        base.join(".cnstd")
    }
}

/// Data directory for downloaded models and other cached files.
///
/// `$CNSTD_HOME`, then `$CNOCR_HOME`, then [`data_dir_default`].
#[must_use]
pub fn data_dir() -> PathBuf {
    [HOME_ENV, LEGACY_HOME_ENV]
        .iter()
        .find_map(|var| {
            std::env::var_os(var)
                .filter(|v| !v.is_empty())
                .map(|v| expand_tilde(Path::new(&v)))
        })
        .unwrap_or_else(data_dir_default)
}

/// Directory holding the unpacked model bundles of the current model version.
#[must_use]
pub fn models_dir() -> PathBuf {
    let override_dir = MODELS_DIR_OVERRIDE.read().ok().and_then(|guard| guard.clone());
    override_dir.unwrap_or_else(|| data_dir().join(MODEL_VERSION))
}

/// Overrides [`models_dir`] for the rest of the process; `None` restores the default.
pub fn set_models_dir(dir: Option<PathBuf>) {
    if let Some(ref d) = dir {
        debug!("Models directory overridden: {}", d.display());
    }
    if let Ok(mut guard) = MODELS_DIR_OVERRIDE.write() {
        *guard = dir.map(|d| expand_tilde(&d));
    }
}

/// Replaces a leading `~` with the home directory.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}
