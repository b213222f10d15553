use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Everything needed to rebuild a trained network.
///
/// `weights[l]` holds `layer_sizes[l] * layer_sizes[l + 1]` values laid out as
/// `source * target_size + target`; `thresholds[l]` holds one bias per neuron
/// of layer `l + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub input_size: usize,
    pub output_size: usize,
    pub alpha: f64,
    pub hidden_sizes: Vec<usize>,
    pub weights: Vec<Vec<f64>>,
    pub thresholds: Vec<Vec<f64>>,
}

impl NetworkParameters {
    /// `[input, hidden..., output]`.
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_sizes.len() + 2);
        sizes.push(self.input_size);
        sizes.extend_from_slice(&self.hidden_sizes);
        sizes.push(self.output_size);
        sizes
    }

    /// Splits a full `[input, hidden..., output]` sequence back into its parts.
    pub fn split_layer_sizes(layer_sizes: &[usize]) -> Result<(usize, Vec<usize>, usize)> {
        match layer_sizes {
            [input, hidden @ .., output] => Ok((*input, hidden.to_vec(), *output)),
            _ => Err(Error::Configuration(format!(
                "a network needs at least an input and an output layer, got {} layer(s)",
                layer_sizes.len()
            ))),
        }
    }

    /// Writes the parameters as pretty-printed JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads parameters previously written by [`NetworkParameters::save_json`].
    pub fn load_json(path: impl AsRef<Path>) -> Result<NetworkParameters> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
