//! Checkpoint loading for safetensors and `PyTorch` pickle files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use once_cell::sync::OnceCell;
use safetensors::SafeTensors;
use tracing::{debug, info};

/// Key prefix added by the training wrapper around the detector.
const WRAPPER_PREFIX: &str = "model.";

/// Entry of a pickled checkpoint holding the weights.
const STATE_DICT_KEY: &str = "state_dict";

/// On-disk checkpoint format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointFormat {
    /// `.safetensors`
    SafeTensors,
    /// `.ckpt`, `.pth`, `.pt`, `.bin`, `.params`
    Pickle,
}

impl CheckpointFormat {
    /// Detects the format of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown extensions.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "safetensors" => Ok(Self::SafeTensors),
            "ckpt" | "pth" | "pt" | "bin" | "params" => Ok(Self::Pickle),
            _ => anyhow::bail!("Unsupported checkpoint format: {}", path.display()),
        }
    }
}

/// Named tensors loaded from a checkpoint file.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    tensors: HashMap<String, Tensor>,
    device: Device,
}

impl Checkpoint {
    /// Loads every tensor of a checkpoint onto `device`.
    ///
    /// Pickled checkpoints are read from their `state_dict` entry when present,
    /// otherwise from the root dictionary. If every key carries the training
    /// wrapper's `model.` prefix, it is stripped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>, device: &Device) -> Result<Self> {
        let path = path.as_ref();
        let tensors = match CheckpointFormat::from_path(path)? {
            CheckpointFormat::SafeTensors => load_safetensors(path, device)?,
            CheckpointFormat::Pickle => load_pickle(path, device)?,
        };
        info!("Loaded {} tensors from {}", tensors.len(), path.display());
        Ok(Self::from_tensors(tensors, device))
    }

    /// Wraps an in-memory tensor map, stripping the wrapper prefix if present.
    #[must_use]
    pub fn from_tensors(tensors: HashMap<String, Tensor>, device: &Device) -> Self {
        Self {
            tensors: strip_wrapper_prefix(tensors),
            device: device.clone(),
        }
    }

    /// Number of tensors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    /// Tensor names in sorted order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tensors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Converts into a `VarBuilder` for constructing a model.
    #[must_use]
    pub fn into_var_builder(self, dtype: DType) -> VarBuilder<'static> {
        VarBuilder::from_tensors(self.tensors, dtype, &self.device)
    }
}

/// Loads a checkpoint and hands its weights to `builder`.
///
/// # Errors
///
/// Returns an error if loading fails or the builder rejects the weights.
pub fn load_model_params<T>(
    path: impl AsRef<Path>,
    device: &Device,
    builder: impl FnOnce(VarBuilder<'static>) -> Result<T>,
) -> Result<T> {
    let path = path.as_ref();
    let checkpoint = Checkpoint::load(path, device)?;
    builder(checkpoint.into_var_builder(DType::F32))
        .with_context(|| format!("Failed to build model from {}", path.display()))
}

/// A lazily-loaded model that defers loading until first access.
pub struct LazyModel<T> {
    path: PathBuf,
    device: Device,
    builder: fn(VarBuilder<'static>) -> Result<T>,
    model: OnceCell<T>,
}

impl<T: Send + Sync> LazyModel<T> {
    /// Creates a new lazy model loader.
    ///
    /// The checkpoint will not be read until `get()` is called.
    #[must_use]
    pub fn new(
        path: impl AsRef<Path>,
        device: Device,
        builder: fn(VarBuilder<'static>) -> Result<T>,
    ) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            device,
            builder,
            model: OnceCell::new(),
        }
    }

    /// Gets the model, loading it if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkpoint cannot be loaded or the builder fails.
    pub fn get(&self) -> Result<&T> {
        self.model.get_or_try_init(|| {
            debug!("Loading model from {}", self.path.display());
            load_model_params(&self.path, &self.device, self.builder)
        })
    }

    /// Returns true if the model has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }
}

fn strip_wrapper_prefix(tensors: HashMap<String, Tensor>) -> HashMap<String, Tensor> {
    if tensors.is_empty() || !tensors.keys().all(|k| k.starts_with(WRAPPER_PREFIX)) {
        return tensors;
    }
    debug!("Stripping '{WRAPPER_PREFIX}' prefix from checkpoint keys");
    tensors
        .into_iter()
        .map(|(k, v)| (k[WRAPPER_PREFIX.len()..].to_string(), v))
        .collect()
}

fn load_safetensors(path: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    debug!("Loading safetensors from {}", path.display());

    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;

    let tensors = SafeTensors::deserialize(&data)
        .with_context(|| format!("Failed to parse safetensors: {}", path.display()))?;

    let mut tensor_map = HashMap::new();
    for name in tensors.names() {
        let view = tensors
            .tensor(name)
            .with_context(|| format!("Failed to get tensor '{name}'"))?;

        let dtype = safetensors_dtype_to_candle(view.dtype())?;
        let tensor = Tensor::from_raw_buffer(view.data(), dtype, view.shape(), device)
            .with_context(|| format!("Failed to create tensor '{name}'"))?;

        tensor_map.insert(name.clone(), tensor);
    }

    Ok(tensor_map)
}

fn load_pickle(path: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    debug!("Loading pickled checkpoint from {}", path.display());

    let entries = match candle_core::pickle::read_all_with_key(path, Some(STATE_DICT_KEY)) {
        Ok(entries) if !entries.is_empty() => entries,
        _ => candle_core::pickle::read_all_with_key(path, None)
            .with_context(|| format!("Failed to parse checkpoint: {}", path.display()))?,
    };

    entries
        .into_iter()
        .map(|(name, tensor)| {
            let tensor = tensor
                .to_device(device)
                .with_context(|| format!("Failed to move tensor '{name}' to device"))?;
            Ok((name, tensor))
        })
        .collect()
}

/// Converts safetensors dtype to candle dtype.
fn safetensors_dtype_to_candle(dtype: safetensors::Dtype) -> Result<DType> {
    use safetensors::Dtype as S;
    match dtype {
        S::F32 => Ok(DType::F32),
        S::F64 => Ok(DType::F64),
        S::F16 => Ok(DType::F16),
        S::BF16 => Ok(DType::BF16),
        S::I64 => Ok(DType::I64),
        S::U8 => Ok(DType::U8),
        S::U32 => Ok(DType::U32),
        other => anyhow::bail!("Unsupported dtype: {other:?}"),
    }
}
