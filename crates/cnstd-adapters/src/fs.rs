//! Filesystem adapter for reading and writing images.

use std::path::Path;

use anyhow::{Context, Result};
use cnstd_core::imaging::{clip_to_u8, hwc_to_chw, hwc_to_rgb, restore_img, rgb_to_hwc};
use ndarray::{Array3, ArrayView3};
use tracing::debug;

/// Reads an image file as an RGB `[C, H, W]` float array with values in `[0, 255]`.
///
/// Grayscale, alpha and 16-bit images are converted to 8-bit RGB first.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn imread(path: impl AsRef<Path>) -> Result<Array3<f32>> {
    let path = path.as_ref();
    let image = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?;
    let rgb = image.to_rgb8();
    debug!(
        "Read {} ({}x{})",
        path.display(),
        rgb.width(),
        rgb.height()
    );
    Ok(hwc_to_chw(rgb_to_hwc(&rgb)))
}

/// Writes an RGB `[H, W, C]` float array to `path`; the format follows the extension.
///
/// With `normalized`, the array is first mapped back from the detector's
/// normalized range. Otherwise values are clipped to `[0, 255]`.
///
/// # Errors
///
/// Returns an error if the array is not 3-channel, the extension is unknown,
/// or writing fails.
pub fn imsave(image: &ArrayView3<'_, f32>, path: impl AsRef<Path>, normalized: bool) -> Result<()> {
    let path = path.as_ref();
    let bytes = if normalized {
        restore_img(image)?
    } else {
        image.mapv(clip_to_u8)
    };
    let rgb = hwc_to_rgb(&bytes.view())?;
    rgb.save(path)
        .with_context(|| format!("Failed to save image: {}", path.display()))?;
    debug!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_imread_missing_file() {
        assert!(imread("/nonexistent/image.png").is_err());
    }

    #[test]
    fn test_imsave_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let img = Array3::<f32>::zeros((2, 2, 3));
        assert!(imsave(&img.view(), dir.path().join("x.unknownext"), false).is_err());
    }

    #[test]
    fn test_imsave_rejects_gray_array() {
        let dir = tempfile::tempdir().unwrap();
        let img = Array3::<f32>::zeros((2, 2, 1));
        assert!(imsave(&img.view(), dir.path().join("x.png"), false).is_err());
    }
}
