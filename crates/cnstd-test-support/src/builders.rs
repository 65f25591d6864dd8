//! Synthetic image builders for testing.

use image::{Rgb, RgbImage};

/// Builder for creating synthetic RGB test images.
pub struct SyntheticImageBuilder;

impl SyntheticImageBuilder {
    /// Creates a single-color image.
    #[must_use]
    pub fn solid(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb(color))
    }

    /// Creates an image whose red channel ramps left to right, green ramps
    /// top to bottom and blue is constant.
    ///
    /// Every pixel differs from its neighbours, which makes channel or axis
    /// mix-ups visible in assertions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let r = ((255 * x) / width.max(1)) as u8;
            let g = ((255 * y) / height.max(1)) as u8;
            Rgb([r, g, 200])
        })
    }

    /// Creates a two-color checkerboard.
    #[must_use]
    pub fn checkerboard(width: u32, height: u32, cell_size: u32) -> RgbImage {
        let cell = cell_size.max(1);
        RgbImage::from_fn(width, height, |x, y| {
            if (x / cell + y / cell) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }
}
