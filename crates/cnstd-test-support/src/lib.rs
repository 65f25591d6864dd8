//! Test support utilities for cnstd.
//!
//! Provides synthetic images, on-disk fixtures (checkpoints, model bundles)
//! and a recording progress sink.
//!
//! # Example
//!
//! ```
//! use cnstd_test_support::{RecordingProgress, SyntheticImageBuilder};
//!
//! let gradient = SyntheticImageBuilder::gradient(16, 8);
//! assert_eq!(gradient.dimensions(), (16, 8));
//!
//! let progress = RecordingProgress::new();
//! assert!(progress.events().is_empty());
//! ```

mod builders;
mod fixtures;
mod mocks;

pub use builders::SyntheticImageBuilder;
pub use fixtures::{
    sha1_hex, write_model_bundle, write_safetensors, write_torch_checkpoint, write_zip, ZipEntry,
};
pub use mocks::RecordingProgress;
