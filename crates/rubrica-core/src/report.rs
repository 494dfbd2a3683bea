//! Report assembly and the canonical text rendering.
//!
//! Findings are validated against the rubric (exactly one per item, severity
//! None exactly when the status is Pass, severe findings cited where
//! required) and then grouped Blocker, High, Polish, Pass, keeping
//! dimension/item declaration order inside each group.
//!
//! Canonical layout:
//!
//! ```text
//! ## QA Review Results
//! ### Score: X/10
//! ### Blockers (must fix)
//! - [description] | [citation]
//! ### High Priority
//! - [description] | [citation]
//! ### Polish
//! - [description] | [citation]
//! ### Passes
//! - [description]
//! ```
//!
//! Every entry occupies exactly one line (plus indented `  - ` detail lines);
//! embedded line breaks in descriptions, citations, notes and fixes are
//! folded into spaces. A section without entries is just its heading.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::domain::{Finding, RenderError, Rubric, Severity, Status};
use crate::score::Score;

/// Citation shown for a non-pass entry with no evidence.
pub const NO_LOCATION: &str = "(no location)";

/// One rendered line of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub item_id: String,
    pub dimension: String,
    pub description: String,
    pub status: Status,
    pub severity: Severity,
    /// Citation strings, verbatim from the artifact.
    pub citations: Vec<String>,
    pub note: Option<String>,
    pub suggested_fix: Option<String>,
}

/// The final, ordered report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub score: Score,
    pub entries: Vec<ReportEntry>,
}

impl Report {
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.severity == severity)
    }

    pub fn blocker_count(&self) -> usize {
        self.with_severity(Severity::Blocker).count()
    }

    /// Drives the process exit code.
    pub fn has_blockers(&self) -> bool {
        self.blocker_count() > 0
    }

    /// Render the canonical text form. Byte-identical for equal reports.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str("## QA Review Results\n");
        out.push_str(&format!("### Score: {}/10\n", self.score));

        let sections = [
            ("### Blockers (must fix)", Severity::Blocker),
            ("### High Priority", Severity::High),
            ("### Polish", Severity::Polish),
            ("### Passes", Severity::None),
        ];
        for (heading, severity) in sections {
            out.push_str(heading);
            out.push('\n');
            for entry in self.with_severity(severity) {
                render_entry(&mut out, entry);
            }
        }
        out
    }
}

fn render_entry(out: &mut String, entry: &ReportEntry) {
    let description = single_line(&entry.description);
    if entry.severity == Severity::None {
        out.push_str(&format!("- {description}\n"));
        return;
    }

    let citation = if entry.citations.is_empty() {
        NO_LOCATION.to_string()
    } else {
        entry
            .citations
            .iter()
            .map(|c| single_line(c))
            .collect::<Vec<_>>()
            .join("; ")
    };
    out.push_str(&format!("- {description} | {citation}\n"));
    if matches!(entry.status, Status::Partial | Status::Unknown) {
        out.push_str(&format!("  - status: {}\n", entry.status));
    }
    if let Some(note) = &entry.note {
        out.push_str(&format!("  - note: {}\n", single_line(note)));
    }
    if let Some(fix) = &entry.suggested_fix {
        out.push_str(&format!("  - fix: {}\n", single_line(fix)));
    }
}

fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Check the finding set against the rubric before rendering.
pub fn validate_findings(rubric: &Rubric, findings: &[Finding]) -> Result<(), RenderError> {
    let mut seen = HashSet::new();
    for finding in findings {
        let item = rubric
            .item(&finding.item_id)
            .ok_or_else(|| RenderError::UnknownItem {
                id: finding.item_id.clone(),
            })?;
        if !seen.insert(finding.item_id.as_str()) {
            return Err(RenderError::DuplicateFinding {
                id: finding.item_id.clone(),
            });
        }
        if finding.status.is_pass() != (finding.severity == Severity::None) {
            return Err(RenderError::InconsistentSeverity {
                id: finding.item_id.clone(),
                status: finding.status.to_string(),
                severity: finding.severity.to_string(),
            });
        }
        if finding.severity.is_severe() && item.requires_location && finding.evidence.is_empty() {
            return Err(RenderError::MissingCitation {
                id: finding.item_id.clone(),
                severity: finding.severity.to_string(),
            });
        }
        if finding.severity == Severity::High && finding.suggested_fix.is_none() {
            return Err(RenderError::MissingSuggestedFix {
                id: finding.item_id.clone(),
            });
        }
    }
    if let Some(missing) = rubric.items().find(|i| !seen.contains(i.id.as_str())) {
        return Err(RenderError::MissingFinding {
            id: missing.id.clone(),
        });
    }
    Ok(())
}

/// Assemble the report. Fails rather than dropping any finding.
pub fn render(
    rubric: &Rubric,
    artifact: &dyn Artifact,
    findings: &[Finding],
    score: Score,
) -> Result<Report, RenderError> {
    validate_findings(rubric, findings)?;

    let mut ordered: Vec<&Finding> = findings.iter().collect();
    ordered.sort_by_key(|f| (f.severity.group_rank(), rubric.position(&f.item_id)));

    let mut entries = Vec::with_capacity(ordered.len());
    for finding in ordered {
        let item = rubric
            .item(&finding.item_id)
            .ok_or_else(|| RenderError::UnknownItem {
                id: finding.item_id.clone(),
            })?;
        entries.push(ReportEntry {
            item_id: item.id.clone(),
            dimension: item.dimension.clone(),
            description: item.description.clone(),
            status: finding.status,
            severity: finding.severity,
            citations: finding
                .evidence
                .iter()
                .map(|e| artifact.cite(&e.locator))
                .collect(),
            note: finding.note.clone(),
            suggested_fix: finding.suggested_fix.clone(),
        });
    }

    Ok(Report { score, entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_renders_all_sections() {
        let report = Report {
            score: Score::from_raw(10.0),
            entries: vec![],
        };
        let expected = "## QA Review Results\n### Score: 10.0/10\n### Blockers (must fix)\n### High Priority\n### Polish\n### Passes\n";
        assert_eq!(report.to_markdown(), expected);
        assert!(!report.has_blockers());
    }

    #[test]
    fn test_entry_rendering() {
        let report = Report {
            score: Score::from_raw(4.5),
            entries: vec![
                ReportEntry {
                    item_id: "h-1".into(),
                    dimension: "Visual".into(),
                    description: "Buttons share one style".into(),
                    status: Status::Partial,
                    severity: Severity::High,
                    citations: vec!["src/a.css:3".into(), "src/b.css:9-10".into()],
                    note: Some("two variants\nfound".into()),
                    suggested_fix: Some("Use the shared button class".into()),
                },
                ReportEntry {
                    item_id: "p-1".into(),
                    dimension: "Visual".into(),
                    description: "Logo is crisp".into(),
                    status: Status::Pass,
                    severity: Severity::None,
                    citations: vec!["logo.svg:1".into()],
                    note: Some("ignored for passes".into()),
                    suggested_fix: None,
                },
            ],
        };
        let md = report.to_markdown();
        assert!(md.starts_with(
            "## QA Review Results\n### Score: 4.5/10\n### Blockers (must fix)\n### High Priority\n"
        ));
        assert!(md.contains(
            "### High Priority\n- Buttons share one style | src/a.css:3; src/b.css:9-10\n  - status: partial\n  - note: two variants found\n  - fix: Use the shared button class\n"
        ));
        assert!(md.contains("### Passes\n- Logo is crisp\n"));
        assert!(!md.contains("ignored for passes"));
    }

    #[test]
    fn test_line_breaks_are_folded() {
        let report = Report {
            score: Score::from_raw(0.0),
            entries: vec![ReportEntry {
                item_id: "p-1".into(),
                dimension: "Copy".into(),
                description: "first line\n### Blockers (must fix)".into(),
                status: Status::Fail,
                severity: Severity::Polish,
                citations: vec!["odd\nname.md:1".into()],
                note: None,
                suggested_fix: None,
            }],
        };
        let md = report.to_markdown();
        assert_eq!(md.matches("### Blockers (must fix)").count(), 2);
        assert!(md.contains(
            "### Polish\n- first line ### Blockers (must fix) | odd name.md:1\n### Passes\n"
        ));
        assert_eq!(md.lines().filter(|l| l.starts_with("### Blockers")).count(), 1);
    }
}
