pub mod cache_port;
pub mod config_port;
pub mod data_port;

pub use cache_port::ArtifactStore;
pub use config_port::ConfigPort;
pub use data_port::BarSource;
