//! Image array conversions and mean-subtraction normalization.
//!
//! Arrays are `ndarray::Array3`. Functions name the axis order they expect:
//! `[H, W, C]` (interleaved, as decoded) or `[C, H, W]` (planar, as fed to
//! the network). Channels are always RGB.

// Allow common image code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};
use image::RgbImage;
use ndarray::{Array3, ArrayView3, Axis};

/// Per-channel RGB mean of the training images.
pub const RGB_MEAN: [f32; 3] = [122.678_914, 116.668_77, 104.006_99];

fn ensure_rgb_channels(channels: usize, layout: &str) -> Result<()> {
    if channels == 3 {
        Ok(())
    } else {
        anyhow::bail!("Expected 3 channels in {layout} array, got {channels}")
    }
}

/// Subtracts [`RGB_MEAN`] and rescales by 1/255, giving values roughly in `[-0.5, 0.6]`.
///
/// Input is `[H, W, C]` with RGB channels, either `u8` or `f32`.
///
/// # Errors
///
/// Returns an error if the last axis does not have 3 channels.
pub fn normalize_img_array<T>(img: &ArrayView3<'_, T>) -> Result<Array3<f32>>
where
    T: Copy + Into<f32>,
{
    ensure_rgb_channels(img.len_of(Axis(2)), "[H, W, C]")?;
    Ok(Array3::from_shape_fn(img.dim(), |(y, x, c)| {
        (img[[y, x, c]].into() - RGB_MEAN[c]) / 255.0
    }))
}

/// Inverse of [`normalize_img_array`]: scales back to pixel values, clipped to `[0, 255]`.
///
/// # Errors
///
/// Returns an error if the last axis does not have 3 channels.
pub fn restore_img(img: &ArrayView3<'_, f32>) -> Result<Array3<u8>> {
    ensure_rgb_channels(img.len_of(Axis(2)), "[H, W, C]")?;
    Ok(Array3::from_shape_fn(img.dim(), |(y, x, c)| {
        clip_to_u8(img[[y, x, c]].mul_add(255.0, RGB_MEAN[c]))
    }))
}

/// Clamps to `[0, 255]` and truncates toward zero. NaN maps to 0.
#[inline]
#[must_use]
pub fn clip_to_u8(v: f32) -> u8 {
    v.clamp(0.0, 255.0) as u8
}

/// Converts a decoded RGB image to a `[H, W, C]` float array.
#[must_use]
pub fn rgb_to_hwc(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
        f32::from(image.get_pixel(x as u32, y as u32)[c])
    })
}

/// Converts a `[H, W, C]` byte array back into an RGB image.
///
/// # Errors
///
/// Returns an error if the array does not have 3 channels or is too large.
pub fn hwc_to_rgb(img: &ArrayView3<'_, u8>) -> Result<RgbImage> {
    let (height, width, channels) = img.dim();
    ensure_rgb_channels(channels, "[H, W, C]")?;
    let width = u32::try_from(width).context("Image width out of range")?;
    let height = u32::try_from(height).context("Image height out of range")?;
    let raw: Vec<u8> = img.as_standard_layout().iter().copied().collect();
    RgbImage::from_raw(width, height, raw).context("Pixel buffer does not match image dimensions")
}

/// Reorders `[H, W, C]` to `[C, H, W]`.
#[must_use]
pub fn hwc_to_chw<T: Clone>(img: Array3<T>) -> Array3<T> {
    img.permuted_axes([2, 0, 1]).as_standard_layout().into_owned()
}

/// Reorders `[C, H, W]` to `[H, W, C]`.
#[must_use]
pub fn chw_to_hwc<T: Clone>(img: Array3<T>) -> Array3<T> {
    img.permuted_axes([1, 2, 0]).as_standard_layout().into_owned()
}

/// Wraps a `[C, H, W]` array as a `(1, C, H, W)` tensor on `device`.
///
/// # Errors
///
/// Returns an error if tensor creation fails.
pub fn to_tensor(chw: &ArrayView3<'_, f32>, device: &Device) -> Result<Tensor> {
    let (c, h, w) = chw.dim();
    let data: Vec<f32> = chw.as_standard_layout().iter().copied().collect();
    Tensor::from_vec(data, (1, c, h, w), device).context("Failed to create image tensor")
}
