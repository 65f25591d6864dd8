//! Core domain types for the text detector support layer.

mod catalog;
mod charset;
mod device_spec;

pub use catalog::{
    check_model_name, find_model, is_available, model_fn_prefix, ModelInfo, AVAILABLE_MODELS,
    BACKBONE_NET_NAMES, MODEL_VERSION,
};
pub use charset::Charset;
pub use device_spec::{is_valid_context, DeviceSpec};
