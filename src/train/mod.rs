pub mod epoch_stats;
pub mod evaluate;
pub mod loop_fn;
pub mod train_config;

pub use epoch_stats::EpochStats;
pub use evaluate::{count_hits, hit_report, HitReport};
pub use loop_fn::train_loop;
pub use train_config::{TrainConfig, DEFAULT_TOLERANCE};
