//! CLI command definitions and handlers.

pub mod charset;
pub mod checkpoint;
pub mod download;
pub mod image;
pub mod models;
pub mod verify;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cnstd_core::DeviceSpec;

/// cnstd - model cache, checksum and checkpoint tooling for the text detector
#[derive(Parser)]
#[command(name = "cnstd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also write logs to this file
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    /// Inference device: cpu, gpu, cuda or cuda:N
    #[arg(long, value_name = "DEVICE", global = true)]
    pub device: Option<DeviceSpec>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Manage pretrained detection models
    Models(models::ModelsArgs),
    /// Download a file, optionally checking its SHA-1
    Download(download::DownloadArgs),
    /// Check a file against an expected SHA-1
    Verify(verify::VerifyArgs),
    /// Load a charset file and report its size
    Charset(charset::CharsetArgs),
    /// List the tensors stored in a checkpoint
    Checkpoint(checkpoint::CheckpointArgs),
    /// Image normalization tools
    Image(image::ImageArgs),
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed.
    Success,
    /// A checksum did not match.
    Mismatch,
    /// Command failed.
    Error,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        match code {
            ExitCode::Success => Self::SUCCESS,
            ExitCode::Mismatch => Self::from(1),
            ExitCode::Error => Self::from(2),
        }
    }
}
