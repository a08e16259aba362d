pub mod config;
pub mod emission;

pub use config::{ChainConfig, ConfigError, EmissionConfig};
pub use emission::{EmissionError, EmissionSchedule, IntoHeight};
