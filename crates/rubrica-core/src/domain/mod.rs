//! Domain models for rubrica.
//!
//! Canonical definitions for the core entities:
//! - `Rubric`: weighted dimensions of checklist items, loaded once per run
//! - `Finding`: per-item outcome with status, severity and evidence
//! - error taxonomy (`ConfigError`, `OracleError`, `RenderError`)

pub mod error;
pub mod finding;
pub mod rubric;

pub use error::{ConfigError, OracleError, RenderError, Result, RubricaError};
pub use finding::{EvidenceLocation, Finding, Locator, Severity, Status};
pub use rubric::{
    CheckDoc, ChecklistItem, Dimension, DimensionDoc, FailureLevel, ItemCheck, ItemDoc, Rubric,
    RubricDoc, SeverityRule, WEIGHT_TOLERANCE,
};
