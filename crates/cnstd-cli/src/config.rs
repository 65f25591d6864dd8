//! Configuration file support for cnstd.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/cnstd/config.toml` (lowest priority)
//! - Project-local: `.cnstd.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::path::{Path, PathBuf};

use cnstd_core::domain::{check_model_name, is_valid_context};
use serde::Deserialize;
use tracing::{debug, info, warn};

/// File name of the project-local config.
pub const PROJECT_CONFIG_NAME: &str = ".cnstd.toml";

/// Log levels accepted in `[logging]`.
const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// A diagnostic raised while loading config.
///
/// Config is read before the subscriber exists, so these are held and
/// replayed through tracing by [`emit_notes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNote {
    Debug(String),
    Info(String),
    Warn(String),
}

/// Replay held config diagnostics at their original level.
pub fn emit_notes(notes: &[ConfigNote]) {
    for note in notes {
        match note {
            ConfigNote::Debug(msg) => debug!("{msg}"),
            ConfigNote::Info(msg) => info!("{msg}"),
            ConfigNote::Warn(msg) => warn!("{msg}"),
        }
    }
}

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General options.
    pub general: GeneralConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Inference settings.
    pub inference: InferenceConfig,
}

/// General configuration options.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory (same role as `$CNSTD_HOME`).
    pub data_dir: Option<PathBuf>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// Mirror base URL for model bundles.
    pub repo_url: Option<String>,
    /// Default backbone.
    pub backbone: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Console level.
    pub level: Option<String>,
    /// Log file path.
    pub file: Option<PathBuf>,
    /// Log file level.
    pub file_level: Option<String>,
}

/// Inference configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Device: `cpu`, `gpu`, `cuda` or `cuda:N`.
    pub device: Option<String>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/cnstd/config.toml`
    /// 2. Project-local: `.cnstd.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as warnings.
    /// The returned notes should be passed to [`emit_notes`] once logging is set up.
    pub fn load() -> (Self, Vec<ConfigNote>) {
        let mut config = Self::default();
        let mut notes = Vec::new();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                notes.push(ConfigNote::Info(format!(
                    "Loading XDG config: {}",
                    xdg_path.display()
                )));
                if let Some(xdg_config) = load_file(&xdg_path, &mut notes) {
                    config = xdg_config;
                }
            } else {
                notes.push(ConfigNote::Debug(format!(
                    "XDG config not found: {}",
                    xdg_path.display()
                )));
            }
        }

        if let Some(project_path) = find_project_config() {
            notes.push(ConfigNote::Info(format!(
                "Loading project config: {}",
                project_path.display()
            )));
            if let Some(project_config) = load_file(&project_path, &mut notes) {
                config.merge(project_config);
            }
        }

        if let Err(e) = config.validate() {
            eprintln!("warning: {e}");
        }

        (config, notes)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref backbone) = self.models.backbone {
            check_model_name(backbone).map_err(|e| format!("models.backbone: {e}"))?;
        }

        for (key, level) in [
            ("logging.level", &self.logging.level),
            ("logging.file_level", &self.logging.file_level),
        ] {
            if let Some(level) = level {
                if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                    return Err(format!(
                        "{key} must be one of {}, got '{level}'",
                        LOG_LEVELS.join(", ")
                    ));
                }
            }
        }

        if let Some(ref device) = self.inference.device {
            if !is_valid_context(device) {
                return Err(format!(
                    "inference.device must be cpu, gpu or cuda[:N], got '{device}'"
                ));
            }
        }

        Ok(())
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    pub fn merge(&mut self, other: Self) {
        self.general.data_dir = other.general.data_dir.or_else(|| self.general.data_dir.take());

        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.models.repo_url = other.models.repo_url.or_else(|| self.models.repo_url.take());
        self.models.backbone = other.models.backbone.or_else(|| self.models.backbone.take());

        self.logging.level = other.logging.level.or_else(|| self.logging.level.take());
        self.logging.file = other.logging.file.or_else(|| self.logging.file.take());
        self.logging.file_level = other
            .logging
            .file_level
            .or_else(|| self.logging.file_level.take());

        self.inference.device = other.inference.device.or_else(|| self.inference.device.take());
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cnstd").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.cnstd.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path, notes: &mut Vec<ConfigNote>) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            notes.push(ConfigNote::Warn(format!(
                "Failed to read config file {}: {e}",
                path.display()
            )));
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("warning: failed to parse config file {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.models.dir.is_none());
        assert!(config.logging.level.is_none());
        assert!(config.inference.device.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[general]
data_dir = '/srv/cnstd'

[models]
dir = '/srv/cnstd/models'
repo_url = 'https://mirror.example/cnstd'
backbone = 'db_resnet18'

[logging]
level = 'debug'
file = '/var/log/cnstd.log'
file_level = 'trace'

[inference]
device = 'cuda:1'
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.general.data_dir, Some(PathBuf::from("/srv/cnstd")));
        assert_eq!(config.models.backbone.as_deref(), Some("db_resnet18"));
        assert_eq!(config.logging.file, Some(PathBuf::from("/var/log/cnstd.log")));
        assert_eq!(config.logging.file_level.as_deref(), Some("trace"));
        assert_eq!(config.inference.device.as_deref(), Some("cuda:1"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_merge_overrides_only_present_values() {
        let mut base: AppConfig = toml::from_str(
            r"
[models]
dir = '/base/models'
backbone = 'db_resnet18'

[logging]
level = 'info'
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[models]
backbone = 'db_mobilenet_v3'

[inference]
device = 'cpu'
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.models.backbone.as_deref(), Some("db_mobilenet_v3"));
        assert_eq!(base.models.dir, Some(PathBuf::from("/base/models")));
        assert_eq!(base.logging.level.as_deref(), Some("info"));
        assert_eq!(base.inference.device.as_deref(), Some("cpu"));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str("[logging]\nfile = 'a.log'\n").expect("parse");
        base.merge(AppConfig::default());
        assert_eq!(base.logging.file, Some(PathBuf::from("a.log")));
    }

    #[test]
    fn test_invalid_field_type_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[models]\nbackbone = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_unknown_backbone() {
        let mut config = AppConfig::default();
        config.models.backbone = Some("vgg".into());
        assert!(config.validate().unwrap_err().contains("models.backbone"));
    }

    #[test]
    fn test_validate_log_levels() {
        let mut config = AppConfig::default();
        config.logging.level = Some("WARN".into());
        assert!(config.validate().is_ok());

        config.logging.file_level = Some("verbose".into());
        assert!(config.validate().unwrap_err().contains("logging.file_level"));
    }

    #[test]
    fn test_validate_device() {
        let mut config = AppConfig::default();
        config.inference.device = Some("tpu".into());
        assert!(config.validate().unwrap_err().contains("inference.device"));
    }

    #[test]
    fn test_unreadable_config_noted_as_warning() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join(PROJECT_CONFIG_NAME);
        std::fs::create_dir(&path).unwrap();

        let mut notes = Vec::new();
        assert!(load_file(&path, &mut notes).is_none());
        assert!(matches!(
            notes.as_slice(),
            [ConfigNote::Warn(msg)] if msg.starts_with("Failed to read config file")
        ));
    }

    #[test]
    fn test_readable_config_adds_no_notes() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join(PROJECT_CONFIG_NAME);
        std::fs::write(&path, "[models]\nbackbone = 'db_resnet18'\n").unwrap();

        let mut notes = Vec::new();
        let config = load_file(&path, &mut notes).unwrap();
        assert_eq!(config.models.backbone.as_deref(), Some("db_resnet18"));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_find_config_in_parents() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(PROJECT_CONFIG_NAME), "").unwrap();

        assert_eq!(
            find_config_in_parents(&nested),
            Some(root.path().join(PROJECT_CONFIG_NAME))
        );
    }
}
