pub mod config;
pub mod error;
pub mod file_config;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::ConcordError;
pub use file_config::{ClusteringConfig, ConsensusConfig, FileConfig, StrategyKind};
pub use store::DataStore;
pub use types::*;
