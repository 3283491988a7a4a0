//! Confidence-drift analysis over the audit log: bucket distribution,
//! Shannon entropy, and per-agent activity.

use std::collections::HashMap;
use std::fmt;

use crate::types::AuditRecord;

/// Entropy below this suggests unnaturally clustered confidence.
pub const LOW_ENTROPY: f64 = 1.2;

/// Entropy above this is a healthy spread.
pub const NORMAL_ENTROPY: f64 = 1.5;

#[derive(Debug, Clone, PartialEq)]
pub struct DriftReport {
    pub total: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub entropy: f64,
    /// Up to five most active agents, most active first.
    pub top_agents: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Clustered,
    Borderline,
    Normal,
}

impl DriftReport {
    pub fn verdict(&self) -> Verdict {
        if self.entropy < LOW_ENTROPY {
            Verdict::Clustered
        } else if self.entropy > NORMAL_ENTROPY {
            Verdict::Normal
        } else {
            Verdict::Borderline
        }
    }
}

pub fn analyze(records: &[AuditRecord]) -> DriftReport {
    let mut low = 0;
    let mut medium = 0;
    let mut high = 0;
    let mut activity: HashMap<String, usize> = HashMap::new();

    for record in records {
        if let AuditRecord::PredictionSubmitted {
            confidence, agent, ..
        } = record
        {
            match confidence {
                c if *c < 34 => low += 1,
                c if *c < 67 => medium += 1,
                _ => high += 1,
            }
            *activity.entry(format!("{agent:?}")).or_default() += 1;
        }
    }

    let total = low + medium + high;
    let entropy = [low, medium, high]
        .iter()
        .map(|&count| bucket_entropy(count, total))
        .sum();

    let mut top_agents: Vec<(String, usize)> = activity.into_iter().collect();
    top_agents.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_agents.truncate(5);

    DriftReport {
        total,
        low,
        medium,
        high,
        entropy,
        top_agents,
    }
}

fn bucket_entropy(count: usize, total: usize) -> f64 {
    if count == 0 || total == 0 {
        return 0.0;
    }
    let p = count as f64 / total as f64;
    -p * p.log2()
}

impl fmt::Display for DriftReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Drift Analysis Report:")?;
        writeln!(f, "----------------------")?;
        writeln!(f, "Total Predictions: {}", self.total)?;
        writeln!(
            f,
            "Confidence Distribution: low={} medium={} high={}",
            self.low, self.medium, self.high
        )?;
        writeln!(f, "Entropy Score: {:.4}", self.entropy)?;
        writeln!(f, "Top Active Agents:")?;
        for (agent, count) in &self.top_agents {
            writeln!(f, "- {agent}: {count} predictions")?;
        }

        match self.verdict() {
            Verdict::Clustered => write!(
                f,
                "Warning: low entropy detected. Prediction confidence may be unnaturally clustered."
            ),
            Verdict::Borderline => write!(f, "Entropy is borderline. Monitor closely."),
            Verdict::Normal => write!(f, "Entropy within normal range."),
        }
    }
}
