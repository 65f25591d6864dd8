//! Model downloading and caching adapter.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use cnstd_core::{find_model, ModelInfo, ProgressSink, AVAILABLE_MODELS};
use tracing::{debug, info};

use crate::archive::extract_zip;
use crate::data_dir::{expand_tilde, models_dir};
use crate::download::{download, DownloadRequest};

/// Environment variable pointing bundle downloads at a mirror.
///
/// Bundles are fetched from `<base>/<name>.zip`.
pub const REPO_URL_ENV: &str = "CNSTD_REPO_URL";

static REPO_URL_OVERRIDE: RwLock<Option<String>> = RwLock::new(None);

/// Overrides the download location of model bundles; `None` restores the default.
pub fn set_repo_url(base: Option<String>) {
    if let Ok(mut guard) = REPO_URL_OVERRIDE.write() {
        *guard = base.map(|b| b.trim_end_matches('/').to_string());
    }
}

/// Where the bundle of `model` is downloaded from.
///
/// A base set with [`set_repo_url`] wins over `$CNSTD_REPO_URL`, which wins
/// over the URL in the catalog.
#[must_use]
pub fn bundle_url(model: &ModelInfo) -> String {
    let base = REPO_URL_OVERRIDE
        .read()
        .ok()
        .and_then(|guard| guard.clone())
        .or_else(|| {
            std::env::var(REPO_URL_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .map(|v| v.trim_end_matches('/').to_string())
        });

    base.map_or_else(
        || model.url.to_string(),
        |b| format!("{b}/{}", model.archive_name()),
    )
}

/// Returns the local directory of a model, downloading and unpacking its
/// bundle first if needed.
///
/// `model_dir` is `<parent>/<model name>`. When it already holds files it is
/// returned as is. Otherwise `<model_dir>.zip` is downloaded unless present,
/// extracted into `<parent>` and deleted.
///
/// # Errors
///
/// Returns an error if:
/// - The model name has no published bundle
/// - Downloading or extracting the bundle fails
/// - The bundle does not contain the model directory
pub fn get_model_file(model_dir: &Path, progress: &dyn ProgressSink) -> Result<PathBuf> {
    let model_dir = expand_tilde(model_dir);
    if is_populated(&model_dir) {
        debug!("Model already unpacked at {}", model_dir.display());
        return Ok(model_dir);
    }

    let model_name = model_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Invalid model directory: {}", model_dir.display()))?;
    let parent = model_dir
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    fs::create_dir_all(&parent)
        .with_context(|| format!("Failed to create models directory {}", parent.display()))?;

    let zip_path = archive_path(&model_dir);
    if !zip_path.exists() {
        let model = find_model(&model_name)
            .with_context(|| format!("{model_name} is not an available downloaded model"))?;
        let request = DownloadRequest::new(bundle_url(model))
            .path(&zip_path)
            .overwrite(true);
        download(&request, progress)?;
    }

    info!("Unpacking {} into {}", zip_path.display(), parent.display());
    extract_zip(&zip_path, &parent)?;
    fs::remove_file(&zip_path)
        .with_context(|| format!("Failed to remove {}", zip_path.display()))?;

    if !model_dir.is_dir() {
        anyhow::bail!(
            "Bundle for {model_name} did not contain a '{model_name}/' directory"
        );
    }
    Ok(model_dir)
}

fn archive_path(model_dir: &Path) -> PathBuf {
    let mut s: OsString = model_dir.as_os_str().to_owned();
    s.push(".zip");
    PathBuf::from(s)
}

fn is_populated(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}

/// Ensures the named models (all published models when `names` is empty)
/// are available in [`models_dir`].
///
/// # Errors
///
/// Returns an error if a name is unknown or a model cannot be fetched.
pub fn ensure_models(names: &[String], progress: &dyn ProgressSink) -> Result<Vec<PathBuf>> {
    let dir = models_dir();
    let selected: Vec<&ModelInfo> = if names.is_empty() {
        AVAILABLE_MODELS.iter().collect()
    } else {
        names
            .iter()
            .map(|n| {
                find_model(n).with_context(|| format!("{n} is not an available downloaded model"))
            })
            .collect::<Result<_>>()?
    };

    selected
        .into_iter()
        .map(|model| get_model_file(&dir.join(model.name), progress))
        .collect()
}

/// Returns the path of a published model's parameter file.
#[must_use]
pub fn model_path(name: &str) -> Option<PathBuf> {
    find_model(name).map(|m| models_dir().join(m.name).join(m.params_file()))
}

/// Checks if all published models are installed.
#[must_use]
pub fn all_models_installed() -> bool {
    list_models().iter().all(|(_, installed)| *installed)
}

/// Lists published models with their install status.
#[must_use]
pub fn list_models() -> Vec<(String, bool)> {
    AVAILABLE_MODELS
        .iter()
        .map(|m| {
            let installed = model_path(m.name).is_some_and(|p| p.exists());
            (m.name.to_string(), installed)
        })
        .collect()
}
