//! Policy configuration
//!
//! The tunables that used to be process-wide globals. A node builds one
//! [`PolicyConfig`] at startup and hands it to every check by reference.

use crate::constants::*;
use crate::error::{PolicyError, Result};
use crate::fee::FeeRate;
use crate::types::Natural;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Relay null-data (OP_RETURN) outputs
    pub accept_datacarrier: bool,
    /// Maximum size of a standard null-data script, OP_RETURN included
    pub max_datacarrier_bytes: usize,
    /// Relay bare (non-P2SH) multisig outputs
    pub permit_bare_multisig: bool,
    /// Minimum fee-rate increase for replacements. Validated and carried for
    /// the admission layer; no check in this crate consumes it yet.
    pub incremental_relay_fee: FeeRate,
    pub dust_relay_fee: FeeRate,
    pub bytes_per_sigop: Natural,
    pub bytes_per_sigop_strict: Natural,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        PolicyConfig {
            accept_datacarrier: DEFAULT_ACCEPT_DATACARRIER,
            max_datacarrier_bytes: MAX_OP_RETURN_RELAY,
            permit_bare_multisig: DEFAULT_PERMIT_BAREMULTISIG,
            incremental_relay_fee: FeeRate::new(DEFAULT_INCREMENTAL_RELAY_FEE),
            dust_relay_fee: FeeRate::new(DUST_RELAY_TX_FEE),
            bytes_per_sigop: DEFAULT_BYTES_PER_SIGOP,
            bytes_per_sigop_strict: DEFAULT_BYTES_PER_SIGOP_STRICT,
        }
    }
}

impl PolicyConfig {
    /// Parse and validate a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PolicyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading policy config {}", path.display()))?;
        let config = PolicyConfig::from_json_str(&json)
            .with_context(|| format!("parsing policy config {}", path.display()))?;

        info!(
            path = %path.display(),
            dust_relay_fee = %config.dust_relay_fee,
            accept_datacarrier = config.accept_datacarrier,
            permit_bare_multisig = config.permit_bare_multisig,
            "loaded relay policy configuration"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dust_relay_fee.sat_per_k() < 0 {
            return Err(PolicyError::Config(format!("negative dust relay fee: {}", self.dust_relay_fee)));
        }
        if self.incremental_relay_fee.sat_per_k() < 0 {
            return Err(PolicyError::Config(format!(
                "negative incremental relay fee: {}",
                self.incremental_relay_fee
            )));
        }
        if self.bytes_per_sigop == 0 || self.bytes_per_sigop_strict == 0 {
            return Err(PolicyError::Config("bytes per sigop must be positive".to_string()));
        }
        Ok(())
    }
}
