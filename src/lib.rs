pub mod activation;
pub mod config;
pub mod dataset;
pub mod error;
pub mod network;
pub mod store;
pub mod train;

// Convenience re-exports
pub use activation::sigmoid::{sigmoid, sigmoid_derivative};
pub use config::{Config, DatasetPaths, Hyperparams};
pub use dataset::dataset::{decode_digit, encode_digit, Dataset};
pub use error::{Error, Result};
pub use network::network::Network;
pub use network::parameters::NetworkParameters;
pub use store::model_file::ModelRecord;
pub use store::store::ModelStore;
pub use train::loop_fn::train_loop;
pub use train::{count_hits, hit_report, EpochStats, HitReport, TrainConfig};
