use std::fs;
use std::path::Path;

use log::debug;

use crate::dataset::idx::{parse_idx_images, parse_idx_labels};
use crate::error::{Error, Result};

/// Side length of an MNIST digit bitmap.
pub const IMAGE_SIDE: u32 = 28;
/// Inputs per sample: one per pixel of a 28x28 bitmap.
pub const IMAGE_PIXELS: usize = (IMAGE_SIDE * IMAGE_SIDE) as usize;

/// Images paired with their scalar-encoded labels (`digit / 10`).
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub images: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

impl Dataset {
    pub fn new(images: Vec<Vec<f64>>, labels: Vec<f64>) -> Result<Dataset> {
        if images.len() != labels.len() {
            return Err(Error::Dataset(format!(
                "{} images but {} labels",
                images.len(),
                labels.len()
            )));
        }
        Ok(Dataset { images, labels })
    }

    /// Decodes an IDX3 image archive and its IDX1 label archive.
    pub fn from_idx_bytes(image_bytes: &[u8], label_bytes: &[u8]) -> Result<Dataset> {
        let images = parse_idx_images(image_bytes)?;
        let labels = parse_idx_labels(label_bytes)?;
        debug!(
            "decoded {} images of {}x{} and {} labels",
            images.images.len(),
            images.rows,
            images.cols,
            labels.len()
        );
        Dataset::new(images.images, labels)
    }

    /// Reads both archives from disk. Any I/O failure is returned with its path.
    pub fn load(images_path: impl AsRef<Path>, labels_path: impl AsRef<Path>) -> Result<Dataset> {
        let images_path = images_path.as_ref();
        let labels_path = labels_path.as_ref();
        let image_bytes = fs::read(images_path).map_err(|e| Error::io(images_path, e))?;
        let label_bytes = fs::read(labels_path).map_err(|e| Error::io(labels_path, e))?;
        Dataset::from_idx_bytes(&image_bytes, &label_bytes)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Keeps at most the first `limit` samples.
    pub fn truncate(&mut self, limit: usize) {
        self.images.truncate(limit);
        self.labels.truncate(limit);
    }

    pub fn sample(&self, index: usize) -> Option<(&[f64], f64)> {
        let image = self.images.get(index)?;
        let label = self.labels.get(index)?;
        Some((image.as_slice(), *label))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f64], f64)> + '_ {
        self.images
            .iter()
            .zip(self.labels.iter())
            .map(|(image, &label)| (image.as_slice(), label))
    }
}

/// Scalar label for a digit, as stored in the dataset.
pub fn encode_digit(digit: u8) -> f64 {
    digit as f64 / 10.0
}

/// Nearest digit to a scalar network output.
pub fn decode_digit(output: f64) -> u8 {
    (output * 10.0).round().clamp(0.0, 9.0) as u8
}
