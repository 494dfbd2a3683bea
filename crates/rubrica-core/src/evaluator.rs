//! Per-item evaluation: located evidence + oracle -> unclassified finding.
//!
//! Policies owned here rather than by the oracle:
//! - evidence-dependent items with no evidence fail without an oracle call
//! - an undecided oracle yields Unknown
//! - transient oracle failures are retried with exponential backoff, then
//!   downgraded to Unknown with the failure reason
//!
//! Definitive answers are never retried.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{ChecklistItem, EvidenceLocation, Finding, OracleError, Status};
use crate::metrics::METRICS;
use crate::obs;
use crate::oracle::{Judgment, JudgmentOracle, JudgmentRequest};

/// Note attached to evidence-dependent items with nothing located.
pub const NO_EVIDENCE_NOTE: &str = "no evidence found";

/// Retry controls for oracle calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first (0 = single attempt).
    pub max_retries: u32,
    /// Wall-clock limit for one attempt (milliseconds).
    pub attempt_timeout_ms: u64,
    /// Base delay for exponential backoff between attempts (milliseconds).
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout_ms: 30_000,
            backoff_base_ms: 200,
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}

/// Judge one item. The returned finding has `Severity::None`; the caller
/// classifies it.
pub async fn evaluate(
    item: &ChecklistItem,
    evidence: Vec<EvidenceLocation>,
    oracle: &dyn JudgmentOracle,
    policy: &RetryPolicy,
) -> Finding {
    if evidence.is_empty() && item.is_evidence_dependent() {
        return Finding::new(&item.id, Status::Fail).with_note(NO_EVIDENCE_NOTE);
    }

    let request = JudgmentRequest::new(item, &evidence);
    let max_attempts = policy.max_retries + 1;
    let timeout = Duration::from_millis(policy.attempt_timeout_ms);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        METRICS.inc_oracle_calls();
        let outcome = match tokio::time::timeout(timeout, oracle.judge(&request)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(OracleError::Timeout {
                elapsed_ms: policy.attempt_timeout_ms,
            }),
        };

        match outcome {
            Ok(judgment) => return finding_from_judgment(&item.id, judgment, evidence),
            Err(e) if e.is_transient() => {
                if attempt < max_attempts {
                    METRICS.inc_oracle_retries();
                    obs::emit_oracle_retry(&item.id, attempt, &e);
                    tokio::time::sleep(policy.backoff(attempt)).await;
                }
                last_error = Some(e);
            }
            Err(e) => {
                METRICS.inc_unknown_downgrades();
                obs::emit_oracle_downgraded(&item.id, attempt, &e);
                return Finding::unknown(&item.id, format!("oracle error: {e}"))
                    .with_evidence(evidence);
            }
        }
    }

    let reason = last_error.map_or_else(|| "no attempt made".to_string(), |e| e.to_string());
    METRICS.inc_unknown_downgrades();
    obs::emit_oracle_downgraded(&item.id, max_attempts, &reason);
    Finding::unknown(
        &item.id,
        format!("oracle failed after {max_attempts} attempt(s): {reason}"),
    )
    .with_evidence(evidence)
}

fn finding_from_judgment(
    item_id: &str,
    judgment: Judgment,
    evidence: Vec<EvidenceLocation>,
) -> Finding {
    match judgment {
        Judgment::Decided {
            verdict,
            justification,
            suggested_fix,
        } => {
            let mut finding = Finding::new(item_id, verdict.into()).with_evidence(evidence);
            if !justification.trim().is_empty() {
                finding.note = Some(justification);
            }
            finding.suggested_fix = suggested_fix;
            finding
        }
        Judgment::Undecided { reason } => Finding::unknown(item_id, reason).with_evidence(evidence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let p = RetryPolicy::default();
        assert_eq!(p.max_retries, 2);
        assert_eq!(p.attempt_timeout_ms, 30_000);
        assert_eq!(p.backoff_base_ms, 200);
    }

    #[test]
    fn test_backoff_doubles() {
        let p = RetryPolicy {
            backoff_base_ms: 100,
            ..RetryPolicy::default()
        };
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(200));
        assert_eq!(p.backoff(3), Duration::from_millis(400));
    }
}
