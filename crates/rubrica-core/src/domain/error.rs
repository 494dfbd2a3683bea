//! Error taxonomy for rubrica.
//!
//! Only [`ConfigError`] and [`RenderError`] abort a run. [`OracleError`] is
//! contained per item: the evaluator retries transient failures and then
//! downgrades the item to an Unknown finding.

use std::path::PathBuf;

/// Malformed or inconsistent rubric configuration. Fatal, raised before any
/// item is evaluated.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read rubric {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse rubric: {0}")]
    Parse(String),

    #[error("rubric defines no dimensions")]
    Empty,

    #[error("dimension '{dimension}' has no explicit weight")]
    MissingWeight { dimension: String },

    #[error("dimension '{dimension}' weight {weight} is outside [0, 1]")]
    WeightOutOfRange { dimension: String, weight: f64 },

    #[error("dimension weights sum to {sum}, expected 1.0")]
    WeightSumMismatch { sum: f64 },

    #[error("duplicate dimension name: {name}")]
    DuplicateDimension { name: String },

    #[error("duplicate item id: {id}")]
    DuplicateItemId { id: String },

    #[error("item '{id}' has an empty description")]
    EmptyDescription { id: String },

    #[error("item '{id}' can classify as High but defines no suggested fix")]
    MissingSuggestedFix { id: String },

    #[error("item '{id}' has invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        id: String,
        pattern: String,
        reason: String,
    },
}

/// Failure of a single judgment-oracle call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("oracle call timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    #[error("oracle transport error: {0}")]
    Transport(String),

    #[error("oracle rejected the request: {0}")]
    Rejected(String),

    #[error("oracle returned a malformed answer: {0}")]
    Malformed(String),
}

impl OracleError {
    /// Whether the same request may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport(_))
    }
}

/// Citation-integrity violation detected while assembling the report. Fatal.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{severity} finding for item '{id}' requires a location citation but has none")]
    MissingCitation { id: String, severity: String },

    #[error("finding for item '{id}' has status {status} but severity {severity}")]
    InconsistentSeverity {
        id: String,
        status: String,
        severity: String,
    },

    #[error("High finding for item '{id}' has no suggested fix")]
    MissingSuggestedFix { id: String },

    #[error("finding references unknown item '{id}'")]
    UnknownItem { id: String },

    #[error("more than one finding for item '{id}'")]
    DuplicateFinding { id: String },

    #[error("no finding for item '{id}'")]
    MissingFinding { id: String },
}

/// Umbrella error for rubrica operations.
#[derive(Debug, thiserror::Error)]
pub enum RubricaError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for rubrica operations.
pub type Result<T> = std::result::Result<T, RubricaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_names_offending_id() {
        let err = ConfigError::DuplicateItemId {
            id: "nav-1".to_string(),
        };
        assert!(err.to_string().contains("duplicate item id"));
        assert!(err.to_string().contains("nav-1"));

        let err = ConfigError::MissingWeight {
            dimension: "Layout".to_string(),
        };
        assert!(err.to_string().contains("Layout"));
    }

    #[test]
    fn test_oracle_error_transience() {
        assert!(OracleError::Timeout { elapsed_ms: 10 }.is_transient());
        assert!(OracleError::Transport("reset".into()).is_transient());
        assert!(!OracleError::Rejected("400".into()).is_transient());
        assert!(!OracleError::Malformed("bad json".into()).is_transient());
    }

    #[test]
    fn test_render_error_wraps_into_umbrella() {
        let err: RubricaError = RenderError::MissingCitation {
            id: "a-1".to_string(),
            severity: "Blocker".to_string(),
        }
        .into();
        let msg = err.to_string();
        assert!(msg.contains("render error"));
        assert!(msg.contains("a-1"));
    }
}
