//! Engine configuration.
//!
//! Loaded from TOML with kebab-case keys. Every field has a default, so an
//! empty file is a valid configuration:
//!
//! ```toml
//! max-fee-numerator = 15
//! max-orders-per-auction = 100000
//! queue-capacity = 1024
//! network-id = 1
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Fees are expressed in thousandths of the auctioned amount.
pub const FEE_DENOMINATOR: u64 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound for the fee numerator the operator may set.
    #[serde(default = "default_max_fee_numerator")]
    pub max_fee_numerator: u64,

    /// Largest book the incremental accumulator will walk.
    #[serde(default = "default_max_orders_per_auction")]
    pub max_orders_per_auction: usize,

    /// Orders pre-allocated per auction queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Network identity bound into allow-list domain separators.
    #[serde(default = "default_network_id")]
    pub network_id: u64,
}

const fn default_max_fee_numerator() -> u64 {
    15
}

const fn default_max_orders_per_auction() -> usize {
    100_000
}

const fn default_queue_capacity() -> usize {
    1_024
}

const fn default_network_id() -> u64 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_fee_numerator: default_max_fee_numerator(),
            max_orders_per_auction: default_max_orders_per_auction(),
            queue_capacity: default_queue_capacity(),
            network_id: default_network_id(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_fee_numerator > FEE_DENOMINATOR {
            return Err(ConfigError::Invalid(format!(
                "max-fee-numerator {} exceeds {}",
                self.max_fee_numerator, FEE_DENOMINATOR
            )));
        }
        if self.max_orders_per_auction == 0 {
            return Err(ConfigError::Invalid(
                "max-orders-per-auction must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
