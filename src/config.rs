use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::IMAGE_PIXELS;
use crate::error::{Error, Result};
use crate::train::DEFAULT_TOLERANCE;

/// Training hyperparameters for a freshly constructed network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparams {
    pub alpha: f64,
    pub hidden_layers: Vec<usize>,
    pub epochs: usize,
    /// Seeds weight initialization and, when shuffling, the sample order.
    pub seed: Option<u64>,
    pub shuffle: bool,
}

impl Default for Hyperparams {
    fn default() -> Self {
        Hyperparams {
            alpha: 0.2,
            hidden_layers: vec![10, 20, 10],
            epochs: 100,
            seed: None,
            shuffle: false,
        }
    }
}

/// File names of the four MNIST archives, relative to `Config::data_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetPaths {
    pub train_images: PathBuf,
    pub train_labels: PathBuf,
    pub test_images: PathBuf,
    pub test_labels: PathBuf,
}

impl Default for DatasetPaths {
    fn default() -> Self {
        DatasetPaths {
            train_images: PathBuf::from("train-images.idx3-ubyte"),
            train_labels: PathBuf::from("train-labels.idx1-ubyte"),
            test_images: PathBuf::from("t10k-images.idx3-ubyte"),
            test_labels: PathBuf::from("t10k-labels.idx1-ubyte"),
        }
    }
}

/// Run configuration. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub store_dir: PathBuf,
    pub dataset: DatasetPaths,
    pub input_size: usize,
    pub output_size: usize,
    pub tolerance: f64,
    /// Use only the first `limit` samples of each set.
    pub limit: Option<usize>,
    pub hyperparams: Hyperparams,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("."),
            store_dir: PathBuf::from("."),
            dataset: DatasetPaths::default(),
            input_size: IMAGE_PIXELS,
            output_size: 1,
            tolerance: DEFAULT_TOLERANCE,
            limit: None,
            hyperparams: Hyperparams::default(),
        }
    }
}

impl Config {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(Error::Configuration(format!(
                "tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if !self.hyperparams.alpha.is_finite() || self.hyperparams.alpha <= 0.0 {
            return Err(Error::Configuration(format!(
                "alpha must be positive, got {}",
                self.hyperparams.alpha
            )));
        }
        if self.hyperparams.hidden_layers.contains(&0) {
            return Err(Error::Configuration(
                "hidden layer sizes must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn train_images(&self) -> PathBuf {
        self.data_dir.join(&self.dataset.train_images)
    }

    pub fn train_labels(&self) -> PathBuf {
        self.data_dir.join(&self.dataset.train_labels)
    }

    pub fn test_images(&self) -> PathBuf {
        self.data_dir.join(&self.dataset.test_images)
    }

    pub fn test_labels(&self) -> PathBuf {
        self.data_dir.join(&self.dataset.test_labels)
    }
}
