use chrono::{DateTime, Utc};
use ethers::types::{Address, H256};
use ethers::utils::keccak256;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, AgentResult};

/// A prediction to be recorded on-chain. Built by the caller, consumed
/// once by submission, never read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictionIntent {
    /// Contract-defined range, 1-100.
    pub confidence: u64,
    pub variables_hash: [u8; 32],
    pub expiry_block: u64,
    pub description: String,
}

/// Resolution of an existing prediction, decided off-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionIntent {
    /// Id the contract assigned at submission time.
    pub prediction_id: u64,
    pub outcome: Outcome,
}

/// Outcome codes understood by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success = 1,
    Failure = 2,
    Undetermined = 3,
}

impl Outcome {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> AgentResult<Self> {
        match code {
            1 => Ok(Outcome::Success),
            2 => Ok(Outcome::Failure),
            3 => Ok(Outcome::Undetermined),
            other => Err(AgentError::Configuration(format!(
                "invalid outcome code {other} (expected 1, 2 or 3)"
            ))),
        }
    }
}

/// Keccak fingerprint of a prediction's variables text.
pub fn hash_variables(text: &str) -> [u8; 32] {
    keccak256(text.as_bytes())
}

/// One decoded contract event, as appended to the audit log. Field and
/// tag names match the JSON shape of the existing audit_log.json files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuditRecord {
    #[serde(rename_all = "camelCase")]
    PredictionSubmitted {
        id: u64,
        agent: Address,
        confidence: u64,
        variables_hash: H256,
        expiry_block: u64,
        description: String,
        block_number: u64,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    PredictionResolved {
        id: u64,
        resolver: Address,
        outcome: u8,
        resolution_block: u64,
        block_number: u64,
        timestamp: DateTime<Utc>,
    },
}

impl AuditRecord {
    pub fn id(&self) -> u64 {
        match self {
            AuditRecord::PredictionSubmitted { id, .. } => *id,
            AuditRecord::PredictionResolved { id, .. } => *id,
        }
    }

    pub fn block_number(&self) -> u64 {
        match self {
            AuditRecord::PredictionSubmitted { block_number, .. } => *block_number,
            AuditRecord::PredictionResolved { block_number, .. } => *block_number,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuditRecord::PredictionSubmitted { .. } => "PredictionSubmitted",
            AuditRecord::PredictionResolved { .. } => "PredictionResolved",
        }
    }
}
