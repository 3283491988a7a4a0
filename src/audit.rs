use std::fs;
use std::path::Path;

use crate::error::{AgentError, AgentResult};
use crate::types::AuditRecord;

/// Loads the audit log, returning an empty list when none exists yet.
pub fn load(path: &Path) -> AgentResult<Vec<AuditRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AgentError::Audit(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| AgentError::Audit(format!("malformed audit log {}: {}", path.display(), e)))
}

/// Appends one record by rewriting the whole JSON array.
pub fn append(path: &Path, record: &AuditRecord) -> AgentResult<()> {
    let mut records = load(path)?;
    records.push(record.clone());

    let raw = serde_json::to_string_pretty(&records)
        .map_err(|e| AgentError::Audit(e.to_string()))?;
    fs::write(path, raw)
        .map_err(|e| AgentError::Audit(format!("cannot write {}: {}", path.display(), e)))?;

    Ok(())
}
