//! Rubric model: weighted dimensions of checklist items.
//!
//! A rubric is loaded once per run from a TOML or JSON document and is
//! read-only afterwards. [`Rubric::from_doc`] is the single validation point;
//! every constructor funnels through it.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::ConfigError;
use super::finding::{Severity, Status};

/// Maximum distance of the weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Severity rules
// ---------------------------------------------------------------------------

/// Severity a failing item can be assigned by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureLevel {
    /// Breaks the core task.
    Blocker,
    /// Visible inconsistency.
    High,
    /// Minor.
    Polish,
}

impl From<FailureLevel> for Severity {
    fn from(level: FailureLevel) -> Self {
        match level {
            FailureLevel::Blocker => Severity::Blocker,
            FailureLevel::High => Severity::High,
            FailureLevel::Polish => Severity::Polish,
        }
    }
}

/// Per-item policy mapping a non-pass judgment to a severity.
///
/// Written either as a bare level (`severity = "blocker"`) or as a table
/// (`severity = { fail = "blocker", partial = "high" }`). Partial follows the
/// Fail level unless configured separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SeverityRule {
    Fixed(FailureLevel),
    ByStatus {
        fail: FailureLevel,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        partial: Option<FailureLevel>,
    },
}

impl Default for SeverityRule {
    fn default() -> Self {
        Self::Fixed(FailureLevel::Polish)
    }
}

impl SeverityRule {
    /// Configured level for `status`; `None` for Pass and Unknown, which the
    /// classifier handles itself.
    pub fn level_for(&self, status: Status) -> Option<FailureLevel> {
        match (self, status) {
            (_, Status::Pass | Status::Unknown) => None,
            (Self::Fixed(level), _) => Some(*level),
            (Self::ByStatus { fail, .. }, Status::Fail) => Some(*fail),
            (Self::ByStatus { fail, partial }, Status::Partial) => Some(partial.unwrap_or(*fail)),
        }
    }

    /// The most severe level this rule can produce.
    pub fn worst(&self) -> FailureLevel {
        let levels = [
            self.level_for(Status::Fail),
            self.level_for(Status::Partial),
        ];
        levels
            .into_iter()
            .flatten()
            .min_by_key(|l| Severity::from(*l).group_rank())
            .unwrap_or(FailureLevel::Polish)
    }

    fn can_yield(&self, level: FailureLevel) -> bool {
        self.level_for(Status::Fail) == Some(level) || self.level_for(Status::Partial) == Some(level)
    }
}

// ---------------------------------------------------------------------------
// Configuration documents
// ---------------------------------------------------------------------------

/// Rubric document as written in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RubricDoc {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub dimensions: Vec<DimensionDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionDoc {
    pub name: String,
    /// Must be present; absence is a configuration error, not a default.
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub items: Vec<ItemDoc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ItemDoc {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub severity: SeverityRule,
    #[serde(default = "default_requires_location")]
    pub requires_location: bool,
    #[serde(default)]
    pub markers: Vec<String>,
    /// Named sections (Markdown headings) the item refers to.
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub artifact_scope: bool,
    #[serde(default)]
    pub fix: Option<String>,
    #[serde(default)]
    pub check: Option<CheckDoc>,
}

/// Deterministic rule consumed by the rule-based oracle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckDoc {
    #[serde(default)]
    pub require: Vec<String>,
    #[serde(default)]
    pub forbid: Vec<String>,
}

fn default_requires_location() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Validated model
// ---------------------------------------------------------------------------

/// Compiled form of [`CheckDoc`].
#[derive(Debug, Clone)]
pub struct ItemCheck {
    pub require: Vec<Regex>,
    pub forbid: Vec<Regex>,
}

/// One checklist item. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct ChecklistItem {
    pub id: String,
    /// Name of the owning dimension.
    pub dimension: String,
    pub description: String,
    pub severity_rule: SeverityRule,
    /// Whether a severe finding for this item must cite a location.
    pub requires_location: bool,
    /// Structural markers searched for by the evidence locator.
    pub markers: Vec<Regex>,
    /// Section headings searched for by the evidence locator, lowercased.
    pub sections: Vec<String>,
    /// The item accepts a whole-artifact citation when no marker matches.
    pub artifact_scope: bool,
    pub suggested_fix: Option<String>,
    pub check: Option<ItemCheck>,
}

impl ChecklistItem {
    /// Items whose judgment cannot be made without located evidence.
    pub fn is_evidence_dependent(&self) -> bool {
        self.requires_location
    }
}

/// A named, weighted group of items.
#[derive(Debug, Clone)]
pub struct Dimension {
    pub name: String,
    pub weight: f64,
    pub items: Vec<ChecklistItem>,
}

/// Validated, read-only rubric.
#[derive(Debug, Clone)]
pub struct Rubric {
    name: String,
    version: Option<String>,
    dimensions: Vec<Dimension>,
    /// item id -> (dimension index, item index)
    positions: HashMap<String, (usize, usize)>,
    digest: String,
}

impl Rubric {
    /// Load a rubric file. `.json` files are parsed as JSON, anything else
    /// as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let doc: RubricDoc = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_doc(doc)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let doc: RubricDoc =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_doc(doc)
    }

    /// Validate a document and build the immutable model.
    pub fn from_doc(doc: RubricDoc) -> Result<Self, ConfigError> {
        if doc.dimensions.is_empty() {
            return Err(ConfigError::Empty);
        }

        let mut dimension_names = HashSet::new();
        let mut sum = 0.0;
        for dim in &doc.dimensions {
            if !dimension_names.insert(dim.name.as_str()) {
                return Err(ConfigError::DuplicateDimension {
                    name: dim.name.clone(),
                });
            }
            let weight = dim.weight.ok_or_else(|| ConfigError::MissingWeight {
                dimension: dim.name.clone(),
            })?;
            if !(0.0..=1.0).contains(&weight) {
                return Err(ConfigError::WeightOutOfRange {
                    dimension: dim.name.clone(),
                    weight,
                });
            }
            sum += weight;
        }
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSumMismatch { sum });
        }

        let mut positions = HashMap::new();
        let mut dimensions = Vec::with_capacity(doc.dimensions.len());
        for (d_idx, dim) in doc.dimensions.into_iter().enumerate() {
            let weight = dim.weight.unwrap_or_default();
            let mut items = Vec::with_capacity(dim.items.len());
            for (i_idx, item) in dim.items.into_iter().enumerate() {
                if positions.insert(item.id.clone(), (d_idx, i_idx)).is_some() {
                    return Err(ConfigError::DuplicateItemId { id: item.id });
                }
                items.push(build_item(&dim.name, item)?);
            }
            dimensions.push(Dimension {
                name: dim.name,
                weight,
                items,
            });
        }

        let digest = compute_rubric_digest(&dimensions);
        Ok(Self {
            name: doc.name.unwrap_or_else(|| "rubric".to_string()),
            version: doc.version,
            dimensions,
            positions,
            digest,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// SHA-256 hex digest over dimension and item declarations.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// All items in dimension/item declaration order.
    pub fn items(&self) -> impl Iterator<Item = &ChecklistItem> {
        self.dimensions.iter().flat_map(|d| d.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.positions.len()
    }

    pub fn item(&self, id: &str) -> Option<&ChecklistItem> {
        let (d, i) = self.position(id)?;
        self.dimensions.get(d)?.items.get(i)
    }

    /// Declaration position of an item, used as the canonical sort key.
    pub fn position(&self, id: &str) -> Option<(usize, usize)> {
        self.positions.get(id).copied()
    }
}

fn build_item(dimension: &str, doc: ItemDoc) -> Result<ChecklistItem, ConfigError> {
    if doc.description.trim().is_empty() {
        return Err(ConfigError::EmptyDescription { id: doc.id });
    }
    let has_fix = doc.fix.as_deref().is_some_and(|f| !f.trim().is_empty());
    if doc.severity.can_yield(FailureLevel::High) && !has_fix {
        return Err(ConfigError::MissingSuggestedFix { id: doc.id });
    }

    let markers = compile_patterns(&doc.id, &doc.markers)?;
    let check = match doc.check {
        Some(c) => Some(ItemCheck {
            require: compile_patterns(&doc.id, &c.require)?,
            forbid: compile_patterns(&doc.id, &c.forbid)?,
        }),
        None => None,
    };

    Ok(ChecklistItem {
        id: doc.id,
        dimension: dimension.to_string(),
        description: doc.description.trim().to_string(),
        severity_rule: doc.severity,
        requires_location: doc.requires_location,
        markers,
        sections: doc
            .sections
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        artifact_scope: doc.artifact_scope,
        suggested_fix: doc.fix.filter(|f| !f.trim().is_empty()),
        check,
    })
}

fn compile_patterns(id: &str, patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                id: id.to_string(),
                pattern: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect()
}

fn compute_rubric_digest(dimensions: &[Dimension]) -> String {
    let mut hasher = Sha256::new();
    for dim in dimensions {
        hasher.update(dim.name.as_bytes());
        hasher.update(b"\0");
        hasher.update(dim.weight.to_bits().to_be_bytes());
        for item in &dim.items {
            hasher.update(item.id.as_bytes());
            hasher.update(b"\0");
            hasher.update(item.description.as_bytes());
            hasher.update(b"\0");
        }
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
name = "ui-qa"

[[dimensions]]
name = "Functionality"
weight = 0.6

[[dimensions.items]]
id = "f-1"
description = "Submit button posts the form"
severity = "blocker"
markers = ["onSubmit"]

[[dimensions.items]]
id = "f-2"
description = "Errors are shown inline"
severity = { fail = "high", partial = "polish" }
fix = "Render validation errors next to the field"

[[dimensions]]
name = "Polish"
weight = 0.4
"#;

    #[test]
    fn test_load_preserves_declaration_order() {
        let rubric = Rubric::from_toml_str(SAMPLE).expect("valid rubric");
        assert_eq!(rubric.name(), "ui-qa");
        let ids: Vec<&str> = rubric.items().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["f-1", "f-2"]);
        assert_eq!(rubric.position("f-2"), Some((0, 1)));
        assert_eq!(rubric.item("f-1").unwrap().dimension, "Functionality");
        assert!(rubric.dimensions()[1].items.is_empty());
    }

    #[test]
    fn test_requires_location_defaults_true() {
        let rubric = Rubric::from_toml_str(SAMPLE).expect("valid rubric");
        assert!(rubric.item("f-1").unwrap().requires_location);
        assert!(!rubric.item("f-1").unwrap().artifact_scope);
    }

    #[test]
    fn test_severity_rule_partial_follows_fail() {
        let rule = SeverityRule::ByStatus {
            fail: FailureLevel::Blocker,
            partial: None,
        };
        assert_eq!(rule.level_for(Status::Partial), Some(FailureLevel::Blocker));
        assert_eq!(rule.level_for(Status::Unknown), None);
        assert_eq!(rule.level_for(Status::Pass), None);
    }

    #[test]
    fn test_severity_rule_worst() {
        let rule = SeverityRule::ByStatus {
            fail: FailureLevel::Polish,
            partial: Some(FailureLevel::High),
        };
        assert_eq!(rule.worst(), FailureLevel::High);
        assert_eq!(SeverityRule::default().worst(), FailureLevel::Polish);
    }

    #[test]
    fn test_digest_is_stable() {
        let a = Rubric::from_toml_str(SAMPLE).unwrap();
        let b = Rubric::from_toml_str(SAMPLE).unwrap();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);
    }
}
