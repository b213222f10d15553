pub mod network;
pub mod parameters;

pub use network::Network;
pub use parameters::NetworkParameters;
