pub mod traits;
pub mod genotype;
pub mod manager;

pub use manager::{AppConfig, ConfigManager};
pub use genotype::GenotypeConfig;
