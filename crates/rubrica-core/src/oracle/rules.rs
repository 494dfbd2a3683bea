//! Deterministic rule-based oracle.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Judgment, JudgmentOracle, JudgmentRequest, Verdict};
use crate::domain::{ItemCheck, OracleError, Rubric};

/// Judges items from their configured `check` rules.
///
/// Any `forbid` pattern found in the evidence fails the item. Otherwise the
/// item passes when every `require` pattern is found, is partial when some
/// are, and fails when none are. Items without a check are undecided.
#[derive(Debug, Clone)]
pub struct RuleOracle {
    checks: Arc<HashMap<String, ItemCheck>>,
}

impl RuleOracle {
    pub fn from_rubric(rubric: &Rubric) -> Self {
        let checks = rubric
            .items()
            .filter_map(|i| i.check.clone().map(|c| (i.id.clone(), c)))
            .collect();
        Self {
            checks: Arc::new(checks),
        }
    }

    fn evaluate(check: &ItemCheck, snippets: &[String]) -> Judgment {
        let found = |re: &regex::Regex| snippets.iter().any(|s| re.is_match(s));

        let forbidden: Vec<&str> = check
            .forbid
            .iter()
            .filter(|re| found(*re))
            .map(|re| re.as_str())
            .collect();
        if !forbidden.is_empty() {
            return Judgment::decided(
                Verdict::Fail,
                format!("forbidden pattern present: {}", forbidden.join(", ")),
            );
        }

        if check.require.is_empty() {
            return Judgment::decided(Verdict::Pass, "no forbidden pattern present");
        }

        let missing: Vec<&str> = check
            .require
            .iter()
            .filter(|re| !found(*re))
            .map(|re| re.as_str())
            .collect();
        let total = check.require.len();
        if missing.is_empty() {
            Judgment::decided(Verdict::Pass, format!("all {total} required patterns present"))
        } else if missing.len() < total {
            Judgment::decided(
                Verdict::Partial,
                format!(
                    "{} of {total} required patterns missing: {}",
                    missing.len(),
                    missing.join(", ")
                ),
            )
        } else {
            Judgment::decided(
                Verdict::Fail,
                format!("required patterns missing: {}", missing.join(", ")),
            )
        }
    }
}

#[async_trait]
impl JudgmentOracle for RuleOracle {
    async fn judge(&self, request: &JudgmentRequest) -> Result<Judgment, OracleError> {
        Ok(match self.checks.get(&request.item_id) {
            Some(check) => Self::evaluate(check, &request.snippets),
            None => Judgment::undecided("no rule configured for this item"),
        })
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}
