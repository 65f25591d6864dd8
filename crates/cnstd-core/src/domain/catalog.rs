//! Model catalog: backbone names, published models and file naming.

use anyhow::Result;

/// Version of the published model files.
///
/// Model bundles live under a directory named after this version inside the
/// data directory, and parameter file names embed it.
pub const MODEL_VERSION: &str = "1.2";

/// Backbone networks the detector can be built with.
pub const BACKBONE_NET_NAMES: &[&str] = &[
    "db_resnet18",
    "db_resnet34",
    "db_resnet50",
    "db_mobilenet_v3",
    "db_mobilenet_v3_small",
    "db_shufflenet_v2",
    "db_shufflenet_v2_small",
    "db_shufflenet_v2_tiny",
];

/// A pretrained model published for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model name; also the name of the directory the bundle unpacks to.
    pub name: &'static str,
    /// Training epoch of the published weights.
    pub epoch: u32,
    /// Download URL of the zipped bundle.
    pub url: &'static str,
}

impl ModelInfo {
    /// File name of the zipped bundle.
    #[must_use]
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.name)
    }

    /// Parameter file name inside the unpacked bundle.
    #[must_use]
    pub fn params_file(&self) -> String {
        model_fn_prefix(self.name, self.epoch)
    }
}

/// Models with published pretrained weights.
pub const AVAILABLE_MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "db_resnet18",
        epoch: 29,
        url: "https://github.com/breezedeus/cnstd/releases/download/v1.2.0/db_resnet18.zip",
    },
    ModelInfo {
        name: "db_resnet34",
        epoch: 27,
        url: "https://github.com/breezedeus/cnstd/releases/download/v1.2.0/db_resnet34.zip",
    },
    ModelInfo {
        name: "db_mobilenet_v3",
        epoch: 47,
        url: "https://github.com/breezedeus/cnstd/releases/download/v1.2.0/db_mobilenet_v3.zip",
    },
    ModelInfo {
        name: "db_mobilenet_v3_small",
        epoch: 37,
        url: "https://github.com/breezedeus/cnstd/releases/download/v1.2.0/db_mobilenet_v3_small.zip",
    },
    ModelInfo {
        name: "db_shufflenet_v2",
        epoch: 41,
        url: "https://github.com/breezedeus/cnstd/releases/download/v1.2.0/db_shufflenet_v2.zip",
    },
    ModelInfo {
        name: "db_shufflenet_v2_small",
        epoch: 34,
        url: "https://github.com/breezedeus/cnstd/releases/download/v1.2.0/db_shufflenet_v2_small.zip",
    },
];

/// Returns the parameter file name for a backbone at a given epoch.
///
/// ```
/// assert_eq!(
///     cnstd_core::model_fn_prefix("db_resnet18", 7),
///     "cnstd-v1.2-db_resnet18-0007.params"
/// );
/// ```
#[must_use]
pub fn model_fn_prefix(backbone: &str, epoch: u32) -> String {
    format!("cnstd-v{MODEL_VERSION}-{backbone}-{epoch:04}.params")
}

/// Ensures `name` is a known backbone.
///
/// # Errors
///
/// Returns an error naming the backbone and the accepted values otherwise.
pub fn check_model_name(name: &str) -> Result<()> {
    if BACKBONE_NET_NAMES.contains(&name) {
        Ok(())
    } else {
        anyhow::bail!(
            "Unknown backbone '{name}', expected one of: {}",
            BACKBONE_NET_NAMES.join(", ")
        )
    }
}

/// Looks up a published model by name.
#[must_use]
pub fn find_model(name: &str) -> Option<&'static ModelInfo> {
    AVAILABLE_MODELS.iter().find(|m| m.name == name)
}

/// Returns true if pretrained weights are published for `name`.
#[must_use]
pub fn is_available(name: &str) -> bool {
    find_model(name).is_some()
}
