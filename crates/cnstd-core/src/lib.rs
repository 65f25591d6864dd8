//! cnstd Core - Domain types, image normalization and checkpoint loading.
//!
//! This crate contains the model catalog, charset handling, device selection,
//! the mean-subtraction image normalization used by the detector, and the
//! checkpoint loaders that turn saved weights into a candle `VarBuilder`.

pub mod domain;
pub mod imaging;
pub mod inference;
pub mod ports;

pub use domain::{
    check_model_name, find_model, model_fn_prefix, Charset, DeviceSpec, ModelInfo,
    AVAILABLE_MODELS, BACKBONE_NET_NAMES, MODEL_VERSION,
};
pub use imaging::{normalize_img_array, restore_img, RGB_MEAN};
pub use inference::{get_device, load_model_params, Checkpoint, LazyModel};
pub use ports::{NoopProgress, ProgressEvent, ProgressSink};
