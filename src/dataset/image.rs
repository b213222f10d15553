//! Image preprocessing for single-picture classification.
//!
//! Decodes PNG/JPEG/BMP/GIF, resizes to the network's bitmap size, converts to
//! grayscale and normalizes pixels to [0, 1], the same scale the IDX loader uses.

use std::path::Path;

use image::imageops::FilterType;

use crate::error::{Error, Result};

/// Returns a flat row-major `Vec<f64>` of length `width * height`.
pub fn image_bytes_to_grayscale_input(bytes: &[u8], width: u32, height: u32) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    let gray = resized.to_luma8();
    Ok(gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect())
}

/// Reads an image file and preprocesses it like [`image_bytes_to_grayscale_input`].
///
/// MNIST digits are light strokes on a dark background; pass `invert` for
/// dark-on-light pictures.
pub fn load_grayscale_input(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    invert: bool,
) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut input = image_bytes_to_grayscale_input(&bytes, width, height)?;
    if invert {
        input.iter_mut().for_each(|px| *px = 1.0 - *px);
    }
    Ok(input)
}
