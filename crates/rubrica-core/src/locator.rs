//! Evidence location: resolve a checklist item to regions of the artifact.
//!
//! Pure and synchronous. Markers are matched line by line, consecutive
//! matching lines collapse into one range, and named sections resolve to
//! Markdown headings. An empty result is a valid outcome.

use serde::{Deserialize, Serialize};

use crate::artifact::Artifact;
use crate::domain::{ChecklistItem, EvidenceLocation, Locator};

/// Bounds on how much evidence is collected per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateOptions {
    /// Maximum number of locations returned for one item.
    pub max_locations: usize,
    /// Maximum snippet length in characters.
    pub snippet_chars: usize,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            max_locations: 5,
            snippet_chars: 160,
        }
    }
}

/// Find candidate evidence for `item` within `artifact`.
///
/// Falls back to a single whole-artifact location only when nothing finer
/// matched and the item sets `artifact_scope`.
pub fn locate(
    item: &ChecklistItem,
    artifact: &dyn Artifact,
    opts: &LocateOptions,
) -> Vec<EvidenceLocation> {
    let mut found = Vec::new();
    let documents = artifact.documents();

    'docs: for (path, text) in &documents {
        if !item.sections.is_empty() {
            for loc in locate_sections(item, text, opts) {
                if found.len() >= opts.max_locations {
                    break 'docs;
                }
                found.push(loc);
            }
        }
        if item.markers.is_empty() {
            continue;
        }

        let mut open: Option<EvidenceLocation> = None;
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx as u32 + 1;
            if !item.markers.iter().any(|m| m.is_match(line)) {
                continue;
            }
            if let Some(loc) = open.as_mut() {
                if let Locator::Lines { end, .. } = &mut loc.locator {
                    if *end + 1 == line_no {
                        *end = line_no;
                        extend_snippet(&mut loc.snippet, line.trim(), opts.snippet_chars);
                        continue;
                    }
                }
            }
            if let Some(done) = open.take() {
                found.push(done);
            }
            if found.len() >= opts.max_locations {
                break 'docs;
            }
            open = Some(EvidenceLocation::new(
                Locator::Lines {
                    path: (*path).to_string(),
                    start: line_no,
                    end: line_no,
                },
                truncate_chars(line.trim(), opts.snippet_chars),
            ));
        }
        // Opened only below the cap, so this push never exceeds it.
        if let Some(done) = open {
            found.push(done);
        }
    }

    if found.is_empty() && item.artifact_scope && opts.max_locations > 0 {
        let excerpt = documents
            .iter()
            .find_map(|(_, text)| text.lines().map(str::trim).find(|l| !l.is_empty()))
            .unwrap_or_default();
        found.push(EvidenceLocation::new(
            Locator::Whole,
            truncate_chars(excerpt, opts.snippet_chars),
        ));
    }

    found
}

fn locate_sections(item: &ChecklistItem, text: &str, opts: &LocateOptions) -> Vec<EvidenceLocation> {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = Vec::new();
    for (idx, line) in lines.iter().enumerate() {
        let Some(heading) = heading_text(line) else {
            continue;
        };
        let lowered = heading.to_lowercase();
        if !item.sections.iter().any(|s| lowered.contains(s.as_str())) {
            continue;
        }
        let body = lines[idx + 1..]
            .iter()
            .map(|l| l.trim())
            .take_while(|l| heading_text(l).is_none())
            .find(|l| !l.is_empty())
            .unwrap_or_default();
        out.push(EvidenceLocation::new(
            Locator::Section {
                name: heading.to_string(),
            },
            truncate_chars(body, opts.snippet_chars),
        ));
    }
    out
}

fn heading_text(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let rest = trimmed.trim_start_matches('#');
    if rest.len() == trimmed.len() || !rest.starts_with(' ') {
        return None;
    }
    let name = rest.trim();
    (!name.is_empty()).then_some(name)
}

fn extend_snippet(snippet: &mut String, line: &str, limit: usize) {
    if snippet.chars().count() >= limit {
        return;
    }
    let joined = format!("{snippet} / {line}");
    *snippet = truncate_chars(&joined, limit);
}

fn truncate_chars(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        return s.to_string();
    }
    let mut out: String = s.chars().take(limit.saturating_sub(1)).collect();
    out.push('…');
    out
}
