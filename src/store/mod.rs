pub mod model_file;
pub mod store;

pub use model_file::ModelRecord;
pub use store::{ModelStore, INDEX_FILE, MODEL_EXTENSION};
