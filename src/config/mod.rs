//! Controller configuration.
//!
//! Built once at startup (TOML file, then command-line overrides), validated,
//! and shared read-only with the engine and the supervisor.

pub mod validation;

use crate::domain::card::AuthKey;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use validation::{
    Validate, validate_data_block, validate_non_empty_string, validate_positive_number,
    validate_topic_prefix,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Topic prefix unique to this device group, e.g. `rfid/its_ace`.
    pub namespace: String,
    pub card: CardConfig,
    pub timing: TimingConfig,
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardConfig {
    /// Data block holding the balance.
    pub block: u8,
    pub key: AuthKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
    pub tick_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub association_attempts: u32,
    pub association_poll_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    pub ssid: String,
    pub password: String,
}

/// The three topics derived from the namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    pub top_up: String,
    pub status: String,
    pub balance: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: "rfid/edge".to_string(),
            card: CardConfig::default(),
            timing: TimingConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            block: 8,
            key: AuthKey::FACTORY,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 400,
            retry_delay_ms: 5_000,
            association_attempts: 20,
            association_poll_ms: 1_000,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ssid: "edge".to_string(),
            password: String::new(),
        }
    }
}

impl ControllerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| LedgerError::Config(format!("TOML parsing error: {e}")))
    }

    pub fn topics(&self) -> Topics {
        Topics {
            top_up: format!("{}/card/topup", self.namespace),
            status: format!("{}/card/status", self.namespace),
            balance: format!("{}/card/balance", self.namespace),
        }
    }
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn association_poll(&self) -> Duration {
        Duration::from_millis(self.association_poll_ms)
    }
}

impl Validate for ControllerConfig {
    fn validate(&self) -> Result<()> {
        validate_topic_prefix("namespace", &self.namespace)?;
        validate_data_block("card.block", self.card.block)?;
        validate_positive_number(
            "timing.association_attempts",
            self.timing.association_attempts,
            1,
        )?;
        validate_non_empty_string("network.ssid", &self.network.ssid)?;
        Ok(())
    }
}
