use containers::Height;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const MEMORY_BLOCKS_LIMIT: usize = 1_000;
pub const BLOCK_ID_POOL_LIMIT: usize = 100;
pub const MIN_CONSENSUS: f64 = 51.0;
pub const TOTAL_PERCENTAGE: f64 = 100.0;

pub const MAX_BLOCK_RELAY: u32 = 2;
pub const MAX_TRS_RELAY: u32 = 2;
pub const REQUEST_BLOCK_LIMIT: usize = 42;
pub const WARM_UP_PAGE_LIMIT: usize = 1_000;

pub const SLOT_INTERVAL_SECS: u64 = 10;
pub const SYNC_TICK_INTERVAL_SECS: u64 = 10;
pub const CURRENT_BLOCK_VERSION: u32 = 1;
pub const MIN_VERSION: u32 = 1;
pub const SOCKET_PORT: u16 = 7008;

pub const REWARD_MILESTONES: [u64; 5] = [
    500_000_000,
    400_000_000,
    300_000_000,
    200_000_000,
    100_000_000,
];
pub const REWARD_DISTANCE: u64 = 3_000_000;
pub const REWARD_OFFSET: Height = 2_160;
pub const TOTAL_AMOUNT: u64 = 10_000_000_000_000_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Reward curve parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmissionConfig {
    pub milestones: Vec<u64>,
    /// Blocks per milestone.
    pub distance: u64,
    /// Height at which rewards begin.
    pub offset: Height,
    /// Supply created at genesis.
    pub total_amount: u64,
}

impl Default for EmissionConfig {
    fn default() -> Self {
        Self {
            milestones: REWARD_MILESTONES.to_vec(),
            distance: REWARD_DISTANCE,
            offset: REWARD_OFFSET,
            total_amount: TOTAL_AMOUNT,
        }
    }
}

/// Node-wide sync, relay and reward parameters, loaded once at startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChainConfig {
    pub memory_blocks_limit: usize,
    pub block_id_pool_limit: usize,
    /// Minimum agreement, in percent, for the local tip to be trusted.
    pub min_consensus: f64,
    pub max_block_relay: u32,
    pub max_trs_relay: u32,
    pub request_block_limit: usize,
    pub warm_up_page_limit: usize,
    pub slot_interval_secs: u64,
    pub sync_tick_interval_secs: u64,
    pub current_block_version: u32,
    pub min_version: u32,
    pub socket_port: u16,
    pub public_host: String,
    pub emission: EmissionConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            memory_blocks_limit: MEMORY_BLOCKS_LIMIT,
            block_id_pool_limit: BLOCK_ID_POOL_LIMIT,
            min_consensus: MIN_CONSENSUS,
            max_block_relay: MAX_BLOCK_RELAY,
            max_trs_relay: MAX_TRS_RELAY,
            request_block_limit: REQUEST_BLOCK_LIMIT,
            warm_up_page_limit: WARM_UP_PAGE_LIMIT,
            slot_interval_secs: SLOT_INTERVAL_SECS,
            sync_tick_interval_secs: SYNC_TICK_INTERVAL_SECS,
            current_block_version: CURRENT_BLOCK_VERSION,
            min_version: MIN_VERSION,
            socket_port: SOCKET_PORT,
            public_host: "127.0.0.1".to_string(),
            emission: EmissionConfig::default(),
        }
    }
}

impl ChainConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: Self = serde_yaml::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.emission.milestones.is_empty() {
            return Err(ConfigError::Invalid("emission milestones must not be empty".into()));
        }
        if self.emission.distance == 0 {
            return Err(ConfigError::Invalid("emission distance must be positive".into()));
        }
        if self.memory_blocks_limit == 0 || self.block_id_pool_limit == 0 {
            return Err(ConfigError::Invalid("memory limits must be positive".into()));
        }
        if self.request_block_limit == 0 || self.warm_up_page_limit == 0 {
            return Err(ConfigError::Invalid("page limits must be positive".into()));
        }
        if self.slot_interval_secs == 0 {
            return Err(ConfigError::Invalid("slot interval must be positive".into()));
        }
        if !(0.0..=TOTAL_PERCENTAGE).contains(&self.min_consensus) {
            return Err(ConfigError::Invalid(format!(
                "min consensus {} is not a percentage",
                self.min_consensus
            )));
        }
        Ok(())
    }

    /// Slot number of a timestamp expressed in seconds since the network epoch.
    pub fn slot_number(&self, created_at: u64) -> u64 {
        created_at / self.slot_interval_secs.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChainConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.memory_blocks_limit, 1_000);
        assert_eq!(config.block_id_pool_limit, 100);
        assert_eq!(config.emission.milestones.len(), 5);
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let yaml = "minConsensus: 80\nemission:\n  distance: 10\n  offset: 5\n";
        let config: ChainConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.min_consensus, 80.0);
        assert_eq!(config.emission.distance, 10);
        assert_eq!(config.emission.milestones, REWARD_MILESTONES.to_vec());
        assert_eq!(config.request_block_limit, REQUEST_BLOCK_LIMIT);
    }

    #[test]
    fn test_validate_rejects_zero_distance() {
        let mut config = ChainConfig::default();
        config.emission.distance = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_slot_number() {
        let config = ChainConfig::default();
        assert_eq!(config.slot_number(0), 0);
        assert_eq!(config.slot_number(19), 1);
        assert_eq!(config.slot_number(20), 2);
    }
}
