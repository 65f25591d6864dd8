//! cnstd Adapters - External adapters for cnstd.
//!
//! This crate provides adapters for:
//! - Data directory resolution
//! - File checksums
//! - HTTP downloads and model bundle caching
//! - Image reading and writing

pub mod archive;
pub mod checksum;
pub mod data_dir;
pub mod download;
pub mod fs;
pub mod models;

pub use checksum::{check_sha1, file_sha1, file_sha256};
pub use data_dir::{data_dir, data_dir_default, models_dir, set_models_dir};
pub use download::{download, DownloadRequest};
pub use fs::{imread, imsave};
pub use models::{ensure_models, get_model_file, model_path, set_repo_url};
