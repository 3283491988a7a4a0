use std::path::PathBuf;

use crate::error::{AgentError, AgentResult};

/// Gas limit used for every submission when GAS_LIMIT is not set.
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

/// Gas price in gwei used for every submission when GAS_PRICE_GWEI is not set.
pub const DEFAULT_GAS_PRICE_GWEI: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limit: u64,
    pub gas_price_gwei: u64,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
            gas_price_gwei: DEFAULT_GAS_PRICE_GWEI,
        }
    }
}

/// Everything the agent needs from the process environment.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub rpc_url: String,
    pub private_key: String,
    pub wallet_address: String,
    pub contract_address: String,
    pub abi_path: PathBuf,
    /// When set, the node's reported chain id must match.
    pub chain_id: Option<u64>,
    pub gas: GasSettings,
}

impl AgentConfig {
    pub fn from_env() -> AgentResult<Self> {
        let rpc_url = require_var("RPC_URL")?;
        let private_key = require_var("PRIVATE_KEY")?;
        let wallet_address = require_var("WALLET_ADDRESS")?;
        let contract_address = require_var("CONTRACT_ADDRESS")?;

        let abi_path = std::env::var("ABI_PATH")
            .unwrap_or_else(|_| "abi/PredictionValidation.json".to_string())
            .into();

        let chain_id = optional_u64("CHAIN_ID")?;

        let mut gas = GasSettings::default();
        if let Some(limit) = optional_u64("GAS_LIMIT")? {
            gas.gas_limit = limit;
        }
        if let Some(price) = optional_u64("GAS_PRICE_GWEI")? {
            gas.gas_price_gwei = price;
        }

        Ok(Self {
            rpc_url,
            private_key,
            wallet_address,
            contract_address,
            abi_path,
            chain_id,
            gas,
        })
    }
}

fn require_var(name: &str) -> AgentResult<String> {
    std::env::var(name).map_err(|_| AgentError::Configuration(format!("{name} must be set")))
}

fn optional_u64(name: &str) -> AgentResult<Option<u64>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AgentError::Configuration(format!("{name} must be an integer, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}
