//! Per-item evaluation outcomes and their evidence.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Judgment status of one checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    Partial,
    /// The oracle could not decide, or the item never completed.
    Unknown,
}

impl Status {
    pub fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Partial => "partial",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Severity attached to a finding. `None` only for passing items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Blocker,
    High,
    Polish,
}

impl Severity {
    /// Report grouping order: Blocker, High, Polish, then passes.
    pub fn group_rank(self) -> u8 {
        match self {
            Self::Blocker => 0,
            Self::High => 1,
            Self::Polish => 2,
            Self::None => 3,
        }
    }

    /// Whether a finding at this severity must be cited when its item
    /// requires a location.
    pub fn is_severe(self) -> bool {
        matches!(self, Self::Blocker | Self::High)
    }

    /// The less severe of two non-`None` levels.
    pub fn at_most(self, cap: Severity) -> Severity {
        if self == Self::None || cap == Self::None {
            return self;
        }
        if self.group_rank() >= cap.group_rank() {
            self
        } else {
            cap
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::Blocker => "Blocker",
            Self::High => "High",
            Self::Polish => "Polish",
        };
        f.write_str(s)
    }
}

/// Opaque address of a region within the artifact under review.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// Inclusive 1-based line range within one document.
    Lines { path: String, start: u32, end: u32 },
    /// A named section when no file/line resolution applies.
    Section { name: String },
    /// The artifact as a whole.
    Whole,
}

/// A located piece of evidence: where it is and a short excerpt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceLocation {
    pub locator: Locator,
    /// Short extracted text, may be empty.
    pub snippet: String,
}

impl EvidenceLocation {
    pub fn new(locator: Locator, snippet: impl Into<String>) -> Self {
        Self {
            locator,
            snippet: snippet.into(),
        }
    }
}

/// Outcome of evaluating one checklist item in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub item_id: String,
    pub status: Status,
    pub severity: Severity,
    pub evidence: Vec<EvidenceLocation>,
    /// Required for Unknown; recommended for Fail and Partial.
    pub note: Option<String>,
    /// Required when severity is High.
    pub suggested_fix: Option<String>,
}

impl Finding {
    /// An unclassified finding; severity is assigned by the classifier.
    pub fn new(item_id: impl Into<String>, status: Status) -> Self {
        Self {
            item_id: item_id.into(),
            status,
            severity: Severity::None,
            evidence: Vec::new(),
            note: None,
            suggested_fix: None,
        }
    }

    /// An Unknown finding carrying the reason the item could not be judged.
    pub fn unknown(item_id: impl Into<String>, note: impl Into<String>) -> Self {
        Self::new(item_id, Status::Unknown).with_note(note)
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<EvidenceLocation>) -> Self {
        self.evidence = evidence;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_rank_orders_blockers_first() {
        let mut levels = vec![
            Severity::None,
            Severity::Polish,
            Severity::Blocker,
            Severity::High,
        ];
        levels.sort_by_key(|s| s.group_rank());
        assert_eq!(
            levels,
            vec![
                Severity::Blocker,
                Severity::High,
                Severity::Polish,
                Severity::None
            ]
        );
    }

    #[test]
    fn test_at_most_caps_severity() {
        assert_eq!(Severity::Blocker.at_most(Severity::Polish), Severity::Polish);
        assert_eq!(Severity::High.at_most(Severity::Polish), Severity::Polish);
        assert_eq!(Severity::Polish.at_most(Severity::High), Severity::Polish);
        assert_eq!(Severity::Blocker.at_most(Severity::High), Severity::High);
    }

    #[test]
    fn test_unknown_finding_carries_note() {
        let f = Finding::unknown("a-1", "oracle unavailable");
        assert_eq!(f.status, Status::Unknown);
        assert_eq!(f.note.as_deref(), Some("oracle unavailable"));
        assert!(f.evidence.is_empty());
    }

    #[test]
    fn test_locator_serde_tagged() {
        let loc = Locator::Lines {
            path: "src/app.tsx".to_string(),
            start: 3,
            end: 4,
        };
        let v = serde_json::to_value(&loc).expect("serialize");
        assert_eq!(v["kind"], "lines");
        assert_eq!(v["start"], 3);
    }
}
