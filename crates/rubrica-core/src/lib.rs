//! Rubrica Core Library
//!
//! Rubric-driven audits: load a weighted checklist, locate evidence in an
//! artifact, judge each item through an oracle, classify severity, score,
//! and render the canonical review report.

pub mod artifact;
pub mod config;
pub mod domain;
pub mod evaluator;
pub mod locator;
pub mod metrics;
pub mod obs;
pub mod oracle;
pub mod pipeline;
pub mod report;
pub mod score;
pub mod severity;
pub mod telemetry;

pub use artifact::{Artifact, FsArtifact, MemoryArtifact};
pub use config::RunConfig;
pub use domain::{
    ChecklistItem, ConfigError, Dimension, EvidenceLocation, FailureLevel, Finding, Locator,
    OracleError, RenderError, Result, Rubric, RubricaError, Severity, SeverityRule, Status,
};
pub use evaluator::{evaluate, RetryPolicy};
pub use locator::{locate, LocateOptions};
pub use oracle::{
    HttpOracle, HttpOracleConfig, HumanOracle, Judgment, JudgmentOracle, JudgmentRequest,
    RuleOracle, Verdict,
};
pub use pipeline::{run_audit, AuditOutcome};
pub use report::{render, validate_findings, Report, ReportEntry};
pub use score::{aggregate, breakdown, DimensionScore, Score, ScoreBreakdown};
pub use severity::{classify, classify_finding};
pub use telemetry::init_tracing;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
