//! Score aggregation.
//!
//! `overall = round1(sum(effective_weight * pass_ratio * 10))`, clamped to
//! [0, 10]. Only Pass counts toward the ratio; Fail, Partial and Unknown all
//! cost score. Dimensions without items drop out and their weight is
//! redistributed proportionally across the remaining dimensions, so the
//! effective weights still sum to 1.0.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Finding, Rubric, Status};

pub const MAX_SCORE: f64 = 10.0;

/// Overall score in [0, 10] with one decimal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Score(f64);

impl Score {
    /// Round to one decimal and clamp to [0, 10].
    pub fn from_raw(raw: f64) -> Self {
        let raw = if raw.is_finite() { raw } else { 0.0 };
        let rounded = (raw * 10.0).round() / 10.0;
        Self(rounded.clamp(0.0, MAX_SCORE))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Contribution of one dimension to the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub name: String,
    pub configured_weight: f64,
    /// Weight after redistribution; 0 for dimensions without items.
    pub effective_weight: f64,
    pub passed: usize,
    pub total: usize,
    pub contribution: f64,
}

/// Per-dimension contributions plus the overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub dimensions: Vec<DimensionScore>,
    pub overall: Score,
}

/// Overall score of `findings` under `rubric`.
pub fn aggregate(findings: &[Finding], rubric: &Rubric) -> Score {
    breakdown(findings, rubric).overall
}

/// Score with per-dimension detail. Pure: depends only on the findings and
/// the rubric's dimension weights.
pub fn breakdown(findings: &[Finding], rubric: &Rubric) -> ScoreBreakdown {
    let status: HashMap<&str, Status> = findings
        .iter()
        .map(|f| (f.item_id.as_str(), f.status))
        .collect();

    let scored: Vec<_> = rubric
        .dimensions()
        .iter()
        .filter(|d| !d.items.is_empty())
        .collect();
    let active_weight: f64 = scored.iter().map(|d| d.weight).sum();
    // All weight sits on item-less dimensions: share it equally.
    let equal_share = if scored.is_empty() {
        0.0
    } else {
        1.0 / scored.len() as f64
    };

    let mut dimensions = Vec::with_capacity(rubric.dimensions().len());
    let mut total = 0.0;
    for dim in rubric.dimensions() {
        let count = dim.items.len();
        let passed = dim
            .items
            .iter()
            .filter(|i| status.get(i.id.as_str()).is_some_and(|s| s.is_pass()))
            .count();

        let effective_weight = if count == 0 {
            0.0
        } else if active_weight > 0.0 {
            dim.weight / active_weight
        } else {
            equal_share
        };
        let ratio = if count == 0 {
            0.0
        } else {
            passed as f64 / count as f64
        };
        let contribution = effective_weight * ratio * MAX_SCORE;
        total += contribution;

        dimensions.push(DimensionScore {
            name: dim.name.clone(),
            configured_weight: dim.weight,
            effective_weight,
            passed,
            total: count,
            contribution,
        });
    }

    ScoreBreakdown {
        dimensions,
        overall: Score::from_raw(total),
    }
}
