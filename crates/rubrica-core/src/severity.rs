//! Severity classification of judged items.
//!
//! Unknown never classifies above Polish: an undecidable item must not block
//! a release. An item that requires a location but has no evidence is capped
//! at Polish as well, so an uncited finding is never escalated.

use crate::domain::{ChecklistItem, Finding, Severity, Status};

/// Severity for `status` under the item's configured rule.
pub fn classify(item: &ChecklistItem, status: Status) -> Severity {
    match status {
        Status::Pass => Severity::None,
        Status::Unknown => Severity::Polish,
        Status::Fail | Status::Partial => item
            .severity_rule
            .level_for(status)
            .map(Severity::from)
            .unwrap_or(Severity::Polish),
    }
}

/// Assign the severity of `finding` in place, applying the evidence cap.
///
/// High findings also receive the item's suggested fix unless the oracle
/// already supplied one.
pub fn classify_finding(item: &ChecklistItem, finding: &mut Finding) {
    let mut severity = classify(item, finding.status);
    if item.requires_location && finding.evidence.is_empty() {
        severity = severity.at_most(Severity::Polish);
    }
    finding.severity = severity;

    if severity != Severity::None && finding.suggested_fix.is_none() {
        finding.suggested_fix = item.suggested_fix.clone();
    }
}
