//! Integration tests for image reading and writing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use cnstd_adapters::{imread, imsave};
use cnstd_core::imaging::{chw_to_hwc, rgb_to_hwc};
use cnstd_core::normalize_img_array;
use cnstd_test_support::SyntheticImageBuilder;
use image::{DynamicImage, GrayImage, Luma};

#[test]
fn test_imread_png_is_chw_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gradient.png");
    let img = SyntheticImageBuilder::gradient(6, 4);
    img.save(&path).unwrap();

    let arr = imread(&path).expect("should read PNG");
    assert_eq!(arr.dim(), (3, 4, 6));

    // Channel 0 is red: ramps along x.
    let px = img.get_pixel(3, 2);
    assert!((arr[[0, 2, 3]] - f32::from(px[0])).abs() < f32::EPSILON);
    assert!((arr[[1, 2, 3]] - f32::from(px[1])).abs() < f32::EPSILON);
    assert!((arr[[2, 2, 3]] - 200.0).abs() < f32::EPSILON);
}

#[test]
fn test_imread_grayscale_expands_to_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");
    let gray = GrayImage::from_pixel(3, 2, Luma([90]));
    DynamicImage::ImageLuma8(gray).save(&path).unwrap();

    let arr = imread(&path).unwrap();
    assert_eq!(arr.dim(), (3, 2, 3));
    assert!(arr.iter().all(|v| (*v - 90.0).abs() < f32::EPSILON));
}

#[test]
fn test_imsave_raw_values_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    let hwc = rgb_to_hwc(&SyntheticImageBuilder::checkerboard(8, 8, 2));

    imsave(&hwc.view(), &path, false).unwrap();
    let back = chw_to_hwc(imread(&path).unwrap());
    assert_eq!(back, hwc);
}

#[test]
fn test_imsave_normalized_restores_pixels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("restored.png");
    let original = rgb_to_hwc(&SyntheticImageBuilder::gradient(5, 5));
    let normalized = normalize_img_array(&original.view()).unwrap();

    imsave(&normalized.view(), &path, true).unwrap();
    let back = chw_to_hwc(imread(&path).unwrap());
    for (a, b) in original.iter().zip(back.iter()) {
        assert!((a - b).abs() <= 1.0, "{a} vs {b}");
    }
}

#[test]
fn test_imsave_clips_out_of_range_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clipped.png");
    let hwc = ndarray::Array3::from_shape_fn((1, 2, 3), |(_, x, _)| if x == 0 { -40.0 } else { 900.0 });

    imsave(&hwc.view(), &path, false).unwrap();
    let back = imread(&path).unwrap();
    assert!((back[[0, 0, 0]]).abs() < f32::EPSILON);
    assert!((back[[0, 0, 1]] - 255.0).abs() < f32::EPSILON);
}
