/// Default hit tolerance: an output counts as correct within ±0.03 of its label.
pub const DEFAULT_TOLERANCE: f64 = 0.03;

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`:    full passes over the training data
/// - `tolerance`: permitted absolute deviation for a prediction to count as a hit
/// - `shuffle`:   visit the training samples in a fresh random order each epoch
/// - `seed`:      seed for the shuffle order; drawn at random when `None`
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub epochs: usize,
    pub tolerance: f64,
    pub shuffle: bool,
    pub seed: Option<u64>,
}

impl TrainConfig {
    /// Fixed sample order, no seed.
    pub fn new(epochs: usize, tolerance: f64) -> Self {
        TrainConfig {
            epochs,
            tolerance,
            shuffle: false,
            seed: None,
        }
    }

    pub fn with_shuffle(mut self, seed: Option<u64>) -> Self {
        self.shuffle = true;
        self.seed = seed;
        self
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(100, DEFAULT_TOLERANCE)
    }
}
