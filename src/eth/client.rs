// src/eth/client.rs

use std::fs;
use std::path::Path;

use ethers::abi::{Abi, Function};
use ethers::prelude::*;

use crate::config::{AgentConfig, GasSettings};
use crate::error::{AgentError, AgentResult};

/// Connection to the PredictionValidation contract: provider, signing
/// key, parsed ABI and gas settings, built once and passed around.
/// Generic over the transport so tests can run against a mock provider.
pub struct PredictionClient<P: JsonRpcClient = Http> {
    provider: Provider<P>,
    wallet: LocalWallet,
    sender: Address,
    contract: Address,
    abi: Abi,
    gas: GasSettings,
    chain_id: u64,
}

impl PredictionClient<Http> {
    /// Connects to the provider, verifies the chain, and loads the
    /// contract ABI. Fails before anything is signed or sent.
    pub async fn connect(config: &AgentConfig) -> AgentResult<Self> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str()).map_err(|e| {
            AgentError::Configuration(format!("invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        // Connectivity check; doubles as the chain-id read.
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| AgentError::Connectivity(format!("chain id query failed: {e}")))?
            .as_u64();

        if let Some(expected) = config.chain_id {
            if chain_id != expected {
                return Err(AgentError::Configuration(format!(
                    "chain id mismatch: expected {expected}, node reports {chain_id}"
                )));
            }
        }

        let wallet: LocalWallet = config
            .private_key
            .parse()
            .map_err(|e| AgentError::Signing(format!("invalid private key: {e}")))?;
        let wallet = wallet.with_chain_id(chain_id);

        let sender: Address = config.wallet_address.parse().map_err(|e| {
            AgentError::Configuration(format!(
                "invalid wallet address '{}': {}",
                config.wallet_address, e
            ))
        })?;

        // A wrong key would otherwise only surface as a confusing nonce
        // or balance rejection at broadcast time.
        if wallet.address() != sender {
            return Err(AgentError::Configuration(format!(
                "private key derives {:?}, but WALLET_ADDRESS is {:?}",
                wallet.address(),
                sender
            )));
        }

        let contract: Address = config.contract_address.parse().map_err(|e| {
            AgentError::Configuration(format!(
                "invalid contract address '{}': {}",
                config.contract_address, e
            ))
        })?;

        let abi = load_abi(&config.abi_path)?;

        tracing::info!(%sender, %contract, chain_id, "connected");

        Self::from_parts(provider, wallet, sender, contract, abi, config.gas, chain_id)
    }
}

impl<P: JsonRpcClient> PredictionClient<P> {
    /// Assembles a client from already-built parts. `connect` is the
    /// production path; tests inject a mock transport here.
    pub fn from_parts(
        provider: Provider<P>,
        wallet: LocalWallet,
        sender: Address,
        contract: Address,
        abi: Abi,
        gas: GasSettings,
        chain_id: u64,
    ) -> AgentResult<Self> {
        for required in ["submitPrediction", "resolvePrediction"] {
            if abi.function(required).is_err() {
                return Err(AgentError::Configuration(format!(
                    "ABI does not declare {required}"
                )));
            }
        }

        Ok(Self {
            provider,
            wallet,
            sender,
            contract,
            abi,
            gas,
            chain_id,
        })
    }

    pub fn function(&self, name: &str) -> AgentResult<&Function> {
        self.abi
            .function(name)
            .map_err(|_| AgentError::Configuration(format!("ABI does not declare {name}")))
    }

    pub async fn block_number(&self) -> AgentResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map(|n| n.as_u64())
            .map_err(|e| AgentError::Rpc(format!("block number query failed: {e}")))
    }

    /// Current transaction count for the sender. Queried fresh before
    /// every submission, never cached.
    pub async fn transaction_count(&self) -> AgentResult<U256> {
        self.provider
            .get_transaction_count(self.sender, None)
            .await
            .map_err(|e| AgentError::Rpc(format!("nonce query failed: {e}")))
    }

    pub async fn get_logs(&self, filter: &Filter) -> AgentResult<Vec<Log>> {
        self.provider
            .get_logs(filter)
            .await
            .map_err(|e| AgentError::Rpc(format!("log query failed: {e}")))
    }

    pub fn provider(&self) -> &Provider<P> {
        &self.provider
    }

    pub fn wallet(&self) -> &LocalWallet {
        &self.wallet
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn gas(&self) -> GasSettings {
        self.gas
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

pub fn load_abi(path: &Path) -> AgentResult<Abi> {
    let raw = fs::read_to_string(path).map_err(|e| {
        AgentError::Configuration(format!("cannot read ABI file {}: {}", path.display(), e))
    })?;
    parse_abi(&raw)
}

/// Accepts either a full Hardhat artifact (object with an "abi" array)
/// or a bare ABI array.
pub fn parse_abi(raw: &str) -> AgentResult<Abi> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| AgentError::Configuration(format!("ABI file is not valid JSON: {e}")))?;

    let abi_value = match value.get("abi") {
        Some(inner) => inner.clone(),
        None => value,
    };

    serde_json::from_value(abi_value)
        .map_err(|e| AgentError::Configuration(format!("malformed ABI: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;

    const ARTIFACT: &str = include_str!("../../abi/PredictionValidation.json");

    #[test]
    fn parses_hardhat_artifact() {
        let abi = parse_abi(ARTIFACT).unwrap();
        assert!(abi.function("submitPrediction").is_ok());
        assert!(abi.function("resolvePrediction").is_ok());
        assert!(abi.event("PredictionSubmitted").is_ok());
        assert!(abi.event("PredictionResolved").is_ok());
    }

    #[test]
    fn parses_bare_abi_array() {
        let artifact: serde_json::Value = serde_json::from_str(ARTIFACT).unwrap();
        let bare = serde_json::to_string(&artifact["abi"]).unwrap();

        let abi = parse_abi(&bare).unwrap();
        assert!(abi.function("submitPrediction").is_ok());
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse_abi("not json"),
            Err(AgentError::Configuration(_))
        ));
    }

    #[test]
    fn from_parts_requires_both_mutating_functions() {
        let (provider, _mock) = Provider::mocked();
        let wallet: LocalWallet =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        let sender = wallet.address();

        let empty: Abi = serde_json::from_str("[]").unwrap();
        let err = PredictionClient::from_parts(
            provider,
            wallet,
            sender,
            Address::zero(),
            empty,
            GasSettings::default(),
            11155111,
        )
        .unwrap_err();

        assert!(err.to_string().contains("submitPrediction"));
    }

    #[test]
    fn unknown_function_lookup_is_a_configuration_error() {
        let (provider, _mock) = Provider::mocked();
        let wallet: LocalWallet =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        let sender = wallet.address();

        let client = PredictionClient::from_parts(
            provider,
            wallet,
            sender,
            Address::zero(),
            parse_abi(ARTIFACT).unwrap(),
            GasSettings::default(),
            11155111,
        )
        .unwrap();

        assert!(client.function("submitPrediction").is_ok());
        assert!(matches!(
            client.function("withdrawEverything"),
            Err(AgentError::Configuration(_))
        ));
    }
}
