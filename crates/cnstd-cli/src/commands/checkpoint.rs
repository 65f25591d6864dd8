//! Checkpoint command - inspect saved model weights.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use cnstd_core::{Checkpoint, DeviceSpec};

/// Arguments for the checkpoint command
#[derive(Args)]
pub struct CheckpointArgs {
    /// Checkpoint file (.safetensors, .ckpt, .pth, .pt, .bin or .params)
    pub file: PathBuf,
}

/// Run the checkpoint command, listing tensors as `name  dtype  shape`.
pub fn run(args: &CheckpointArgs, device: DeviceSpec) -> Result<()> {
    let checkpoint = Checkpoint::load(&args.file, &device.resolve())?;

    for name in checkpoint.names() {
        let tensor = checkpoint
            .get(name)
            .with_context(|| format!("Tensor '{name}' disappeared from checkpoint"))?;
        println!("{name}\t{:?}\t{:?}", tensor.dtype(), tensor.dims());
    }
    println!("{} tensors", checkpoint.len());
    Ok(())
}
