//! Structured observability hooks for audit runs.
//!
//! This module provides:
//! - An audit-scoped tracing span carried into every item task
//! - Emission functions for lifecycle events: start, per-item outcome,
//!   oracle retry/downgrade, run timeout, finish
//!
//! Logs go to stderr; stdout is reserved for the report.

use tracing::{info, warn};

use crate::domain::{Severity, Status};

/// Audit-scoped span tagged with the run id and a short rubric digest.
///
/// Attach it with `tracing::Instrument` so the span follows the audit
/// across every spawned item task:
///
/// ```ignore
/// run(rubric).instrument(audit_span(&run_id, rubric.digest())).await
/// ```
pub fn audit_span(run_id: &str, rubric_digest: &str) -> tracing::Span {
    let digest = rubric_digest.get(..12).unwrap_or(rubric_digest);
    tracing::info_span!("rubrica.audit", run_id = %run_id, rubric = %digest)
}

pub fn emit_audit_started(run_id: &str, rubric_name: &str, items: usize, concurrency: usize) {
    info!(
        event = "audit.started",
        run_id = %run_id,
        rubric = %rubric_name,
        items = items,
        concurrency = concurrency,
    );
}

pub fn emit_item_evaluated(item_id: &str, status: Status, severity: Severity, evidence: usize) {
    info!(
        event = "item.evaluated",
        item_id = %item_id,
        status = %status,
        severity = %severity,
        evidence = evidence,
    );
}

pub fn emit_oracle_retry(item_id: &str, attempt: u32, error: &dyn std::fmt::Display) {
    warn!(event = "oracle.retry", item_id = %item_id, attempt = attempt, error = %error);
}

/// An oracle failure was converted into an Unknown finding.
pub fn emit_oracle_downgraded(item_id: &str, attempts: u32, error: &dyn std::fmt::Display) {
    warn!(
        event = "oracle.downgraded",
        item_id = %item_id,
        attempts = attempts,
        error = %error,
    );
}

pub fn emit_audit_timed_out(run_id: &str, timeout_ms: u64, pending: usize) {
    warn!(
        event = "audit.timed_out",
        run_id = %run_id,
        timeout_ms = timeout_ms,
        pending = pending,
    );
}

pub fn emit_audit_finished(run_id: &str, duration_ms: u64, score: f64, blockers: usize) {
    info!(
        event = "audit.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        score = score,
        blockers = blockers,
    );
}
