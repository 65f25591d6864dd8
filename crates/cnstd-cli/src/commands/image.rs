//! Image command - normalization round trip.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use cnstd_adapters::{imread, imsave};
use cnstd_core::imaging::{chw_to_hwc, hwc_to_chw, to_tensor};
use cnstd_core::{normalize_img_array, DeviceSpec};
use tracing::info;

/// Arguments for the image command
#[derive(Args)]
pub struct ImageArgs {
    #[command(subcommand)]
    pub command: ImageCommand,
}

/// Image subcommands
#[derive(Subcommand)]
pub enum ImageCommand {
    /// Read an image, normalize it and save the restored result
    Normalize {
        /// Input image
        input: PathBuf,
        /// Output image (format follows the extension)
        output: PathBuf,
    },
}

/// Run the image command.
pub fn run(args: &ImageArgs, device: DeviceSpec) -> Result<()> {
    match &args.command {
        ImageCommand::Normalize { input, output } => normalize(input, output, device),
    }
}

fn normalize(input: &Path, output: &Path, device: DeviceSpec) -> Result<()> {
    let hwc = chw_to_hwc(imread(input)?);
    let normalized = normalize_img_array(&hwc.view())?;

    let (min, max) = normalized
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let tensor = to_tensor(&hwc_to_chw(normalized.clone()).view(), &device.resolve())?;
    info!("Input tensor {:?}", tensor.dims());

    imsave(&normalized.view(), output, true)?;
    println!(
        "{} -> {}: shape {:?}, range [{min:.3}, {max:.3}]",
        input.display(),
        output.display(),
        tensor.dims()
    );
    Ok(())
}
