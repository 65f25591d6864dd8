//! Model weight loading and device selection for candle inference.

mod checkpoint;
mod device;

pub use checkpoint::{load_model_params, Checkpoint, CheckpointFormat, LazyModel};
pub use device::get_device;
