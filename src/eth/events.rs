// src/eth/events.rs

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use ethers::abi::{Event, RawLog, Token};
use ethers::prelude::*;

use super::client::PredictionClient;
use crate::audit;
use crate::error::{AgentError, AgentResult};
use crate::types::AuditRecord;

pub const SUBMITTED_EVENT: &str = "PredictionSubmitted";
pub const RESOLVED_EVENT: &str = "PredictionResolved";

/// A decoded PredictionSubmitted log.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedPrediction {
    pub id: u64,
    pub agent: Address,
    pub confidence: u64,
    pub variables_hash: H256,
    pub expiry_block: u64,
    pub description: String,
    pub block_number: u64,
}

/// A decoded PredictionResolved log.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPrediction {
    pub id: u64,
    pub resolver: Address,
    pub outcome: u8,
    pub resolution_block: u64,
    pub block_number: u64,
}

impl SubmittedPrediction {
    pub fn into_record(self) -> AuditRecord {
        AuditRecord::PredictionSubmitted {
            id: self.id,
            agent: self.agent,
            confidence: self.confidence,
            variables_hash: self.variables_hash,
            expiry_block: self.expiry_block,
            description: self.description,
            block_number: self.block_number,
            timestamp: Utc::now(),
        }
    }
}

impl ResolvedPrediction {
    pub fn into_record(self) -> AuditRecord {
        AuditRecord::PredictionResolved {
            id: self.id,
            resolver: self.resolver,
            outcome: self.outcome,
            resolution_block: self.resolution_block,
            block_number: self.block_number,
            timestamp: Utc::now(),
        }
    }
}

pub async fn fetch_submitted<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    from_block: u64,
    to_block: u64,
) -> AgentResult<Vec<SubmittedPrediction>> {
    let event = abi_event(client, SUBMITTED_EVENT)?;
    let logs = client
        .get_logs(&event_filter(client, event, from_block, to_block))
        .await?;
    logs.iter().map(|log| decode_submitted(event, log)).collect()
}

pub async fn fetch_resolved<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    from_block: u64,
    to_block: u64,
) -> AgentResult<Vec<ResolvedPrediction>> {
    let event = abi_event(client, RESOLVED_EVENT)?;
    let logs = client
        .get_logs(&event_filter(client, event, from_block, to_block))
        .await?;
    logs.iter().map(|log| decode_resolved(event, log)).collect()
}

/// Most recent submission within `lookback_blocks` of the head, by
/// contract-assigned id. None when the window holds no submissions.
pub async fn latest_prediction<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    lookback_blocks: u64,
) -> AgentResult<Option<SubmittedPrediction>> {
    let head = client.block_number().await?;
    let from = head.saturating_sub(lookback_blocks);

    let mut submissions = fetch_submitted(client, from, head).await?;
    submissions.sort_by_key(|s| s.id);
    Ok(submissions.pop())
}

/// Polls for new contract events and appends each to the audit log.
/// Runs until the process is killed; any chain or log failure ends it.
pub async fn watch<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    from_block: Option<u64>,
    poll_interval: Duration,
    audit_path: &Path,
) -> AgentResult<()> {
    let mut next_block = match from_block {
        Some(block) => block,
        None => client.block_number().await? + 1,
    };

    tracing::info!(next_block, "watching for contract events");

    loop {
        let head = client.block_number().await?;

        if head >= next_block {
            let mut records: Vec<AuditRecord> = fetch_submitted(client, next_block, head)
                .await?
                .into_iter()
                .map(SubmittedPrediction::into_record)
                .collect();
            records.extend(
                fetch_resolved(client, next_block, head)
                    .await?
                    .into_iter()
                    .map(ResolvedPrediction::into_record),
            );
            records.sort_by_key(|r| (r.block_number(), r.id()));

            for record in records {
                audit::append(audit_path, &record)?;
                println!("Logged event: {} #{}", record.label(), record.id());
            }

            next_block = head + 1;
        }

        tokio::time::sleep(poll_interval).await;
    }
}

fn abi_event<'a, P: JsonRpcClient>(
    client: &'a PredictionClient<P>,
    name: &str,
) -> AgentResult<&'a Event> {
    client
        .abi()
        .event(name)
        .map_err(|_| AgentError::Configuration(format!("ABI does not declare event {name}")))
}

fn event_filter<P: JsonRpcClient>(
    client: &PredictionClient<P>,
    event: &Event,
    from_block: u64,
    to_block: u64,
) -> Filter {
    Filter::new()
        .address(client.contract_address())
        .topic0(event.signature())
        .from_block(from_block)
        .to_block(to_block)
}

fn decode_submitted(event: &Event, log: &Log) -> AgentResult<SubmittedPrediction> {
    let decoded = parse_log(event, log)?;

    Ok(SubmittedPrediction {
        id: uint_param(&decoded, "id")?,
        agent: address_param(&decoded, "agent")?,
        confidence: uint_param(&decoded, "confidence")?,
        variables_hash: hash_param(&decoded, "variablesHash")?,
        expiry_block: uint_param(&decoded, "expiryBlock")?,
        description: string_param(&decoded, "description")?,
        block_number: log.block_number.map(|n| n.as_u64()).unwrap_or_default(),
    })
}

fn decode_resolved(event: &Event, log: &Log) -> AgentResult<ResolvedPrediction> {
    let decoded = parse_log(event, log)?;

    Ok(ResolvedPrediction {
        id: uint_param(&decoded, "id")?,
        resolver: address_param(&decoded, "resolver")?,
        outcome: uint_param(&decoded, "outcome")? as u8,
        resolution_block: uint_param(&decoded, "resolutionBlock")?,
        block_number: log.block_number.map(|n| n.as_u64()).unwrap_or_default(),
    })
}

fn parse_log(event: &Event, log: &Log) -> AgentResult<ethers::abi::Log> {
    event
        .parse_log(RawLog {
            topics: log.topics.clone(),
            data: log.data.to_vec(),
        })
        .map_err(|e| {
            AgentError::Configuration(format!("{} log does not match ABI: {}", event.name, e))
        })
}

fn param<'a>(decoded: &'a ethers::abi::Log, name: &str) -> AgentResult<&'a Token> {
    decoded
        .params
        .iter()
        .find(|p| p.name == name)
        .map(|p| &p.value)
        .ok_or_else(|| AgentError::Configuration(format!("event log missing param {name}")))
}

fn uint_param(decoded: &ethers::abi::Log, name: &str) -> AgentResult<u64> {
    match param(decoded, name)? {
        Token::Uint(value) if value.bits() <= 64 => Ok(value.as_u64()),
        other => Err(AgentError::Configuration(format!(
            "param {name} is not a u64-sized uint: {other:?}"
        ))),
    }
}

fn address_param(decoded: &ethers::abi::Log, name: &str) -> AgentResult<Address> {
    match param(decoded, name)? {
        Token::Address(address) => Ok(*address),
        other => Err(AgentError::Configuration(format!(
            "param {name} is not an address: {other:?}"
        ))),
    }
}

fn hash_param(decoded: &ethers::abi::Log, name: &str) -> AgentResult<H256> {
    match param(decoded, name)? {
        Token::FixedBytes(bytes) if bytes.len() == 32 => Ok(H256::from_slice(bytes)),
        other => Err(AgentError::Configuration(format!(
            "param {name} is not bytes32: {other:?}"
        ))),
    }
}

fn string_param(decoded: &ethers::abi::Log, name: &str) -> AgentResult<String> {
    match param(decoded, name)? {
        Token::String(value) => Ok(value.clone()),
        other => Err(AgentError::Configuration(format!(
            "param {name} is not a string: {other:?}"
        ))),
    }
}
