use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Every failure the library can report.
#[derive(Debug, Error)]
pub enum Error {
    /// An input or expected-output vector does not match the layer size fixed
    /// at construction. Raised before the network is touched.
    #[error("{what} has length {actual}, but the network expects {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Layer sizes, alpha or restored parameter shapes are inconsistent.
    #[error("invalid network configuration: {0}")]
    Configuration(String),

    /// The requested model name is absent from the store index.
    #[error("model '{0}' is not in the index")]
    NotFound(String),

    /// A model with this name has already been saved.
    #[error("model name '{0}' is already taken")]
    DuplicateName(String),

    /// The name cannot be used as a model file name.
    #[error("invalid model name {0:?}")]
    InvalidName(String),

    #[error("model '{name}', line {line}: {reason}")]
    ModelFormat {
        name: String,
        line: usize,
        reason: String,
    },

    /// Malformed IDX image or label archive.
    #[error("dataset: {0}")]
    Dataset(String),

    #[error("image decoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    /// Attaches the offending path to an I/O error.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
