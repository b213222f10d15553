use std::time::Instant;

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::evaluate::count_hits;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` for `config.epochs` epochs of online gradient descent.
///
/// After every epoch the hit counts on `training` and, if given, on `test`
/// are logged, handed to `on_epoch`, and collected into the returned history.
///
/// # Errors
/// Stops at the first sample whose image or label does not fit the network.
pub fn train_loop<F>(
    network: &mut Network,
    training: &Dataset,
    test: Option<&Dataset>,
    config: &TrainConfig,
    mut on_epoch: F,
) -> Result<Vec<EpochStats>>
where
    F: FnMut(&EpochStats),
{
    let mut history = Vec::with_capacity(config.epochs);
    let mut order: Vec<usize> = (0..training.len()).collect();

    let mut rng = if config.shuffle {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!("shuffling training samples with seed {}", seed);
        Some(StdRng::seed_from_u64(seed))
    } else {
        None
    };

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();

        if let Some(rng) = rng.as_mut() {
            order.shuffle(rng);
        }
        run_one_epoch(network, training, &order)?;

        let training_hits = count_hits(network, training, config.tolerance)?;
        let test_hits = match test {
            Some(data) => Some(count_hits(network, data, config.tolerance)?),
            None => None,
        };

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            training_hits,
            training_total: training.len(),
            test_hits,
            test_total: test.map(Dataset::len),
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };

        match stats.test_hits {
            Some(test_hits) => info!(
                "epoch {}/{}: training hits {}/{}, test hits {}/{}",
                epoch,
                config.epochs,
                training_hits,
                stats.training_total,
                test_hits,
                stats.test_total.unwrap_or(0)
            ),
            None => info!(
                "epoch {}/{}: training hits {}/{}",
                epoch, config.epochs, training_hits, stats.training_total
            ),
        }

        on_epoch(&stats);
        history.push(stats);
    }

    Ok(history)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// One training step per sample, visiting samples in `order`.
fn run_one_epoch(network: &mut Network, training: &Dataset, order: &[usize]) -> Result<()> {
    for &idx in order {
        let label = training.labels[idx];
        network.train_step(&training.images[idx], &[label])?;
    }
    Ok(())
}
