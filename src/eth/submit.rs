// src/eth/submit.rs

use ethers::abi::{Function, Token};
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::parse_units;

use super::client::PredictionClient;
use crate::error::{AgentError, AgentResult};
use crate::types::{PredictionIntent, ResolutionIntent};

/// Encodes a call to `function_name` and submits it as a signed legacy
/// transaction. Returns once the node has accepted the transaction into
/// its pending pool; confirmation is never waited on, and nothing is
/// retried. Calling twice submits two independent transactions.
pub async fn submit<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    function_name: &str,
    args: Vec<Token>,
) -> AgentResult<TxHash> {
    let function = client.function(function_name)?;
    let data = encode_call(function, &args)?;

    // Fresh nonce for every submission.
    let nonce = client.transaction_count().await?;

    let tx = build_transaction(client, data, nonce)?;

    let signature = client
        .wallet()
        .sign_transaction(&tx)
        .await
        .map_err(|e| AgentError::Signing(e.to_string()))?;
    let raw = tx.rlp_signed(&signature);

    let pending = client
        .provider()
        .send_raw_transaction(raw)
        .await
        .map_err(|e| AgentError::ChainRejection(e.to_string()))?;
    let tx_hash = *pending;

    tracing::info!(function = function_name, %tx_hash, %nonce, "transaction broadcast");

    Ok(tx_hash)
}

pub async fn submit_prediction<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    intent: &PredictionIntent,
) -> AgentResult<TxHash> {
    submit(client, "submitPrediction", prediction_tokens(intent)).await
}

pub async fn resolve_prediction<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    intent: &ResolutionIntent,
) -> AgentResult<TxHash> {
    submit(client, "resolvePrediction", resolution_tokens(intent)).await
}

/// Legacy envelope: from, to, data, nonce, fixed gas limit and price.
fn build_transaction<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    data: Bytes,
    nonce: U256,
) -> AgentResult<TypedTransaction> {
    let gas = client.gas();
    let gas_price: U256 = parse_units(gas.gas_price_gwei, "gwei")
        .map_err(|e| AgentError::Configuration(format!("invalid gas price: {e}")))?
        .into();

    let tx = TransactionRequest::new()
        .from(client.sender())
        .to(client.contract_address())
        .data(data)
        .nonce(nonce)
        .gas(gas.gas_limit)
        .gas_price(gas_price)
        .chain_id(client.chain_id());

    Ok(tx.into())
}

/// Call data for `function`: selector followed by the ABI-encoded args.
pub fn encode_call(function: &Function, args: &[Token]) -> AgentResult<Bytes> {
    function
        .encode_input(args)
        .map(Into::into)
        .map_err(|e| {
            AgentError::Configuration(format!(
                "arguments do not match {}: {}",
                function.name, e
            ))
        })
}

pub fn prediction_tokens(intent: &PredictionIntent) -> Vec<Token> {
    vec![
        Token::Uint(intent.confidence.into()),
        Token::FixedBytes(intent.variables_hash.to_vec()),
        Token::Uint(intent.expiry_block.into()),
        Token::String(intent.description.clone()),
    ]
}

pub fn resolution_tokens(intent: &ResolutionIntent) -> Vec<Token> {
    vec![
        Token::Uint(intent.prediction_id.into()),
        Token::Uint(u64::from(intent.outcome.code()).into()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GasSettings;
    use crate::eth::client::parse_abi;
    use crate::types::{Outcome, hash_variables};

    const ARTIFACT: &str = include_str!("../../abi/PredictionValidation.json");

    fn test_client(provider: Provider<MockProvider>) -> PredictionClient<MockProvider> {
        let wallet: LocalWallet =
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
                .parse()
                .unwrap();
        let wallet = wallet.with_chain_id(11155111u64);
        let sender = wallet.address();

        PredictionClient::from_parts(
            provider,
            wallet,
            sender,
            "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap(),
            parse_abi(ARTIFACT).unwrap(),
            GasSettings::default(),
            11155111,
        )
        .unwrap()
    }

    fn sample_intent() -> PredictionIntent {
        PredictionIntent {
            confidence: 87,
            variables_hash: hash_variables("wallet:0xabc123|amount:2ETH|mixer:Tornado"),
            expiry_block: 1_000_050,
            description: "Wallet 0xabc123... will send 2 ETH to a known mixer in the next 50 blocks"
                .to_string(),
        }
    }

    #[test]
    fn prediction_payload_round_trips() {
        let abi = parse_abi(ARTIFACT).unwrap();
        let function = abi.function("submitPrediction").unwrap();

        let intent = sample_intent();
        let tokens = prediction_tokens(&intent);
        let data = encode_call(function, &tokens).unwrap();

        // Selector plus ABI words.
        assert_eq!(&data[..4], &function.short_signature());
        let decoded = function.decode_input(&data[4..]).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn resolution_payload_round_trips() {
        let abi = parse_abi(ARTIFACT).unwrap();
        let function = abi.function("resolvePrediction").unwrap();

        let intent = ResolutionIntent {
            prediction_id: 1,
            outcome: Outcome::Success,
        };
        let tokens = resolution_tokens(&intent);
        let data = encode_call(function, &tokens).unwrap();

        let decoded = function.decode_input(&data[4..]).unwrap();
        assert_eq!(
            decoded,
            vec![Token::Uint(1u64.into()), Token::Uint(1u64.into())]
        );
    }

    #[test]
    fn encode_rejects_mismatched_arguments() {
        let abi = parse_abi(ARTIFACT).unwrap();
        let function = abi.function("resolvePrediction").unwrap();

        let err = encode_call(function, &[Token::Uint(1u64.into())]).unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    #[test]
    fn envelope_carries_nonce_gas_and_call_data() {
        let (provider, _mock) = Provider::mocked();
        let client = test_client(provider);

        let function = client.function("resolvePrediction").unwrap();
        let data = encode_call(
            function,
            &resolution_tokens(&ResolutionIntent {
                prediction_id: 7,
                outcome: Outcome::Failure,
            }),
        )
        .unwrap();

        let tx = build_transaction(&client, data.clone(), U256::from(42)).unwrap();

        assert_eq!(tx.nonce(), Some(&U256::from(42)));
        assert_eq!(tx.gas(), Some(&U256::from(300_000)));
        // 20 gwei in wei.
        assert_eq!(tx.gas_price(), Some(U256::from(20_000_000_000u64)));
        assert_eq!(tx.data(), Some(&data));
        assert_eq!(tx.chain_id(), Some(11155111u64.into()));
        assert_eq!(tx.from(), Some(&client.sender()));
        assert_eq!(tx.to(), Some(&client.contract_address().into()));
    }

    #[tokio::test]
    async fn submit_reports_the_hash_the_node_accepted() {
        let (provider, mock) = Provider::mocked();
        let client = test_client(provider);

        let accepted = TxHash::from_low_u64_be(0xbeef);
        // Responses pop in reverse push order: nonce first, then broadcast.
        mock.push(accepted).unwrap();
        mock.push(U256::from(3)).unwrap();

        let hash = submit_prediction(&client, &sample_intent()).await.unwrap();
        assert_eq!(hash, accepted);
    }

    #[tokio::test]
    async fn submit_queries_a_fresh_nonce_every_call() {
        let (provider, mock) = Provider::mocked();
        let client = test_client(provider);

        let first = TxHash::from_low_u64_be(1);
        let second = TxHash::from_low_u64_be(2);
        mock.push(second).unwrap();
        mock.push(U256::from(9)).unwrap();
        mock.push(first).unwrap();
        mock.push(U256::from(8)).unwrap();

        assert_eq!(submit_prediction(&client, &sample_intent()).await.unwrap(), first);
        assert_eq!(submit_prediction(&client, &sample_intent()).await.unwrap(), second);

        // Both nonce responses were consumed; a third call finds nothing
        // cached and fails at the nonce query, before any broadcast.
        let err = submit_prediction(&client, &sample_intent()).await.unwrap_err();
        assert!(matches!(err, AgentError::Rpc(_)));
    }

    #[tokio::test]
    async fn broadcast_failure_surfaces_as_chain_rejection() {
        let (provider, mock) = Provider::mocked();
        let client = test_client(provider);

        // Nonce succeeds, broadcast has no response and errors.
        mock.push(U256::from(3)).unwrap();

        let err = submit_prediction(&client, &sample_intent()).await.unwrap_err();
        assert!(matches!(err, AgentError::ChainRejection(_)));
    }

    #[tokio::test]
    async fn unknown_function_fails_before_any_network_call() {
        let (provider, _mock) = Provider::mocked();
        let client = test_client(provider);

        // Nothing pushed: any RPC would error as Rpc, but the lookup
        // fails first as Configuration.
        let err = submit(&client, "noSuchFunction", vec![]).await.unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }
}
