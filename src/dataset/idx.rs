//! Decoding of the IDX archives MNIST ships in.
//!
//! # IDX3 image file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x03        (number of dimensions = 3)
//! bytes  4-7:   N           (number of images, big-endian u32)
//! bytes  8-11:  rows        (image height in pixels, big-endian u32)
//! bytes 12-15:  cols        (image width in pixels, big-endian u32)
//! bytes 16..:   N * rows * cols bytes, row-major, uint8
//! ```
//!
//! # IDX1 label file layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     0x01        (number of dimensions = 1)
//! bytes  4-7:   N           (number of labels, big-endian u32)
//! bytes  8..:   N bytes, each a digit in [0, 9]
//! ```

use crate::error::{Error, Result};

pub const IMAGE_HEADER_LEN: usize = 16;
pub const LABEL_HEADER_LEN: usize = 8;

/// Decoded image archive. Pixels are divided by 255 so they lie in [0, 1].
#[derive(Debug, Clone)]
pub struct IdxImages {
    pub rows: usize,
    pub cols: usize,
    pub images: Vec<Vec<f64>>,
}

pub fn parse_idx_images(bytes: &[u8]) -> Result<IdxImages> {
    check_header(bytes, IMAGE_HEADER_LEN, 0x03, "image")?;

    let n_items = read_u32_be(bytes, 4);
    let rows = read_u32_be(bytes, 8);
    let cols = read_u32_be(bytes, 12);

    let n_pixels = rows.checked_mul(cols).ok_or_else(|| {
        Error::Dataset(format!(
            "IDX image file: rows * cols overflows (rows={}, cols={}).",
            rows, cols
        ))
    })?;
    if n_pixels == 0 {
        return Err(Error::Dataset(format!(
            "IDX image file: images of {}x{} pixels are empty.",
            rows, cols
        )));
    }
    let data_len = n_items.checked_mul(n_pixels).ok_or_else(|| {
        Error::Dataset(format!(
            "IDX image file: {} images of {} pixels overflow.",
            n_items, n_pixels
        ))
    })?;

    let available = bytes.len() - IMAGE_HEADER_LEN;
    if available < data_len {
        return Err(Error::Dataset(format!(
            "IDX image file too short: header declares {} images of {}x{} pixels \
             ({} data bytes), but only {} follow the header.",
            n_items, rows, cols, data_len, available
        )));
    }

    let images = bytes[IMAGE_HEADER_LEN..IMAGE_HEADER_LEN + data_len]
        .chunks_exact(n_pixels)
        .map(|chunk| chunk.iter().map(|&px| px as f64 / 255.0).collect())
        .collect();

    Ok(IdxImages { rows, cols, images })
}

/// Decodes a label archive into scalars in [0, 0.9] (digit / 10).
pub fn parse_idx_labels(bytes: &[u8]) -> Result<Vec<f64>> {
    check_header(bytes, LABEL_HEADER_LEN, 0x01, "label")?;

    let n_items = read_u32_be(bytes, 4);
    let available = bytes.len() - LABEL_HEADER_LEN;
    if available < n_items {
        return Err(Error::Dataset(format!(
            "IDX label file too short: header declares {} labels, but only {} follow the header.",
            n_items, available
        )));
    }

    bytes[LABEL_HEADER_LEN..LABEL_HEADER_LEN + n_items]
        .iter()
        .enumerate()
        .map(|(i, &digit)| {
            if digit > 9 {
                return Err(Error::Dataset(format!(
                    "IDX label at index {}: {} is not a digit.",
                    i, digit
                )));
            }
            Ok(digit as f64 / 10.0)
        })
        .collect()
}

fn check_header(bytes: &[u8], header_len: usize, dims: u8, kind: &str) -> Result<()> {
    if bytes.len() < header_len {
        return Err(Error::Dataset(format!(
            "IDX {} file too short: expected at least {} header bytes, got {}.",
            kind,
            header_len,
            bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::Dataset(format!(
            "IDX {} file: bytes 0-1 must be 0x00 0x00, got 0x{:02X} 0x{:02X}.",
            kind, bytes[0], bytes[1]
        )));
    }
    if bytes[2] != 0x08 {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            kind, bytes[2]
        )));
    }
    if bytes[3] != dims {
        return Err(Error::Dataset(format!(
            "IDX {} file: byte 3 (dimensions) must be {}, got {}.",
            kind, dims, bytes[3]
        )));
    }
    Ok(())
}

fn read_u32_be(bytes: &[u8], offset: usize) -> usize {
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]) as usize
}
