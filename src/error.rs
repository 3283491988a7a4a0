use thiserror::Error;

/// Failure classes for the agent. Nothing here is retried; every error
/// propagates to the caller and ends the run.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Provider unreachable, or the startup connectivity check failed.
    #[error("provider not connected: {0}")]
    Connectivity(String),

    /// Bad environment, ABI file, address, or chain-id mismatch.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed private key or signature failure.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The node rejected a built or signed transaction (bad nonce,
    /// insufficient funds, gas too low, reverted call).
    #[error("transaction rejected by node: {0}")]
    ChainRejection(String),

    /// A chain query (nonce, block number, logs) failed mid-flight.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Audit log could not be read or written.
    #[error("audit log error: {0}")]
    Audit(String),
}

pub type AgentResult<T> = Result<T, AgentError>;
