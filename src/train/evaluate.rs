use crate::dataset::Dataset;
use crate::error::Result;
use crate::network::Network;

/// Hit counts on both halves of a dataset split, as stored with a saved model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitReport {
    pub training_hits: usize,
    pub test_hits: usize,
}

/// Number of samples whose output lies within `tolerance` of the label.
pub fn count_hits(network: &mut Network, data: &Dataset, tolerance: f64) -> Result<usize> {
    let mut hits = 0;
    for (image, label) in data.iter() {
        if network.evaluate(image, &[label], tolerance)? {
            hits += 1;
        }
    }
    Ok(hits)
}

pub fn hit_report(
    network: &mut Network,
    training: &Dataset,
    test: &Dataset,
    tolerance: f64,
) -> Result<HitReport> {
    Ok(HitReport {
        training_hits: count_hits(network, training, tolerance)?,
        test_hits: count_hits(network, test, tolerance)?,
    })
}
