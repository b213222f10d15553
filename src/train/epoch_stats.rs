use serde::{Deserialize, Serialize};

/// Hit counts reported by `train_loop` after each completed epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    pub total_epochs: usize,
    pub training_hits: usize,
    pub training_total: usize,
    /// Only set when a held-out set was provided.
    pub test_hits: Option<usize>,
    pub test_total: Option<usize>,
    /// Wall-clock duration of the epoch, evaluation included, in milliseconds.
    pub elapsed_ms: u64,
}

impl EpochStats {
    /// Training hits as a fraction in [0, 1].
    pub fn training_accuracy(&self) -> f64 {
        fraction(self.training_hits, self.training_total)
    }

    pub fn test_accuracy(&self) -> Option<f64> {
        Some(fraction(self.test_hits?, self.test_total?))
    }
}

fn fraction(hits: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
