//! Judgment oracle: the injected capability that decides whether evidence
//! satisfies a checklist item.
//!
//! The pipeline only sees the [`JudgmentOracle`] trait. Three
//! implementations ship with the crate:
//! - [`RuleOracle`]: deterministic, driven by per-item `check` rules
//! - [`HumanOracle`]: asks a reviewer over an async reader/writer pair
//! - [`HttpOracle`]: delegates to a model-backed HTTP service

pub mod http;
pub mod human;
pub mod rules;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{ChecklistItem, EvidenceLocation, OracleError, Status};

pub use http::{HttpOracle, HttpOracleConfig};
pub use human::HumanOracle;
pub use rules::RuleOracle;

/// Input to a single judgment call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentRequest {
    pub item_id: String,
    pub description: String,
    pub snippets: Vec<String>,
}

impl JudgmentRequest {
    pub fn new(item: &ChecklistItem, evidence: &[EvidenceLocation]) -> Self {
        Self {
            item_id: item.id.clone(),
            description: item.description.clone(),
            snippets: evidence.iter().map(|e| e.snippet.clone()).collect(),
        }
    }
}

/// A definitive answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    Partial,
}

impl From<Verdict> for Status {
    fn from(v: Verdict) -> Self {
        match v {
            Verdict::Pass => Status::Pass,
            Verdict::Fail => Status::Fail,
            Verdict::Partial => Status::Partial,
        }
    }
}

/// Outcome of a successful oracle call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Judgment {
    Decided {
        verdict: Verdict,
        justification: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggested_fix: Option<String>,
    },
    /// The oracle cannot decide this item.
    Undecided { reason: String },
}

impl Judgment {
    pub fn decided(verdict: Verdict, justification: impl Into<String>) -> Self {
        Self::Decided {
            verdict,
            justification: justification.into(),
            suggested_fix: None,
        }
    }

    pub fn undecided(reason: impl Into<String>) -> Self {
        Self::Undecided {
            reason: reason.into(),
        }
    }
}

/// Pluggable judgment capability.
///
/// Implementations must be safe to call concurrently from several items.
/// Transient failures (`Timeout`, `Transport`) are retried by the evaluator;
/// everything else is accepted as final.
#[async_trait]
pub trait JudgmentOracle: Send + Sync {
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, OracleError>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judgment_serde_shape() {
        let j = Judgment::decided(Verdict::Partial, "two of three labels present");
        let v = serde_json::to_value(&j).expect("serialize");
        assert_eq!(v["outcome"], "decided");
        assert_eq!(v["verdict"], "partial");
        assert!(v.get("suggested_fix").is_none());

        let back: Judgment = serde_json::from_value(v).expect("deserialize");
        assert_eq!(back, j);
    }

    #[test]
    fn test_verdict_maps_to_status() {
        assert_eq!(Status::from(Verdict::Pass), Status::Pass);
        assert_eq!(Status::from(Verdict::Partial), Status::Partial);
    }
}
