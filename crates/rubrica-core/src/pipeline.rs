//! Audit orchestration: locate -> evaluate -> classify per item, then
//! aggregate and render.
//!
//! Items run concurrently, bounded by a semaphore. Results are collected by
//! a single task into a map keyed by item id and re-sorted into declaration
//! order, so completion order never reaches the report. A run-level timeout
//! aborts in-flight work; items that did not finish become Unknown findings
//! instead of going missing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{warn, Instrument};
use uuid::Uuid;

use crate::artifact::Artifact;
use crate::config::RunConfig;
use crate::domain::{Finding, Result, Rubric};
use crate::evaluator::{evaluate, RetryPolicy};
use crate::locator::{locate, LocateOptions};
use crate::metrics::METRICS;
use crate::obs;
use crate::oracle::JudgmentOracle;
use crate::report::{render, Report};
use crate::score::{breakdown, ScoreBreakdown};
use crate::severity::classify_finding;

/// Everything produced by one audit run.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub run_id: String,
    /// One finding per item, in declaration order.
    pub findings: Vec<Finding>,
    pub breakdown: ScoreBreakdown,
    pub report: Report,
    /// The run-level deadline expired before every item completed.
    pub timed_out: bool,
}

/// Run a complete audit of `artifact` against `rubric`.
///
/// Fails only on citation-integrity violations; oracle trouble and timeouts
/// surface as Unknown findings in the report.
pub async fn run_audit(
    rubric: Arc<Rubric>,
    artifact: Arc<dyn Artifact>,
    oracle: Arc<dyn JudgmentOracle>,
    config: &RunConfig,
) -> Result<AuditOutcome> {
    let run_id = Uuid::new_v4().to_string();
    let span = obs::audit_span(&run_id, rubric.digest());
    run_audit_inner(run_id, rubric, artifact, oracle, config)
        .instrument(span)
        .await
}

async fn run_audit_inner(
    run_id: String,
    rubric: Arc<Rubric>,
    artifact: Arc<dyn Artifact>,
    oracle: Arc<dyn JudgmentOracle>,
    config: &RunConfig,
) -> Result<AuditOutcome> {
    let started = Instant::now();
    let baseline = METRICS.snapshot();
    let concurrency = config.concurrency.max(1);
    obs::emit_audit_started(&run_id, rubric.name(), rubric.item_count(), concurrency);

    let (mut results, timed_out) = evaluate_items(
        &rubric,
        &artifact,
        &oracle,
        concurrency,
        &config.retry,
        &config.locate,
        config.run_timeout_ms,
    )
    .await;

    let pending = rubric
        .items()
        .filter(|i| !results.contains_key(&i.id))
        .count();
    if timed_out {
        obs::emit_audit_timed_out(&run_id, config.run_timeout_ms.unwrap_or_default(), pending);
    }

    let mut findings = Vec::with_capacity(rubric.item_count());
    for item in rubric.items() {
        let finding = match results.remove(&item.id) {
            Some(f) => f,
            None => {
                let note = match config.run_timeout_ms {
                    Some(ms) if timed_out => {
                        format!("run timed out after {ms}ms before this item completed")
                    }
                    _ => "evaluation did not complete".to_string(),
                };
                let mut f = Finding::unknown(&item.id, note);
                classify_finding(item, &mut f);
                obs::emit_item_evaluated(&item.id, f.status, f.severity, 0);
                f
            }
        };
        findings.push(finding);
    }

    let scored = breakdown(&findings, &rubric);
    let report = render(&rubric, artifact.as_ref(), &findings, scored.overall)?;

    obs::emit_audit_finished(
        &run_id,
        started.elapsed().as_millis() as u64,
        scored.overall.value(),
        report.blocker_count(),
    );
    METRICS.flush_since(&run_id, &baseline);

    Ok(AuditOutcome {
        run_id,
        findings,
        breakdown: scored,
        report,
        timed_out,
    })
}

/// Evaluate every item concurrently. Returns the completed findings keyed by
/// item id and whether the deadline cut the run short.
async fn evaluate_items(
    rubric: &Arc<Rubric>,
    artifact: &Arc<dyn Artifact>,
    oracle: &Arc<dyn JudgmentOracle>,
    concurrency: usize,
    retry: &RetryPolicy,
    locate_opts: &LocateOptions,
    run_timeout_ms: Option<u64>,
) -> (HashMap<String, Finding>, bool) {
    let sem = Arc::new(Semaphore::new(concurrency));
    let mut join_set = JoinSet::new();

    for item in rubric.items() {
        let item_id = item.id.clone();
        let rubric = Arc::clone(rubric);
        let artifact = Arc::clone(artifact);
        let oracle = Arc::clone(oracle);
        let sem = Arc::clone(&sem);
        let retry = retry.clone();
        let locate_opts = *locate_opts;

        let task = async move {
            let _permit = sem.acquire_owned().await.ok();
            let Some(item) = rubric.item(&item_id) else {
                return (item_id, None);
            };

            let evidence = locate(item, artifact.as_ref(), &locate_opts);
            let mut finding = evaluate(item, evidence, oracle.as_ref(), &retry).await;
            classify_finding(item, &mut finding);

            METRICS.inc_items_evaluated();
            obs::emit_item_evaluated(
                &item.id,
                finding.status,
                finding.severity,
                finding.evidence.len(),
            );
            (item_id, Some(finding))
        };
        join_set.spawn(task.in_current_span());
    }

    let mut results = HashMap::with_capacity(rubric.item_count());
    let collect = async {
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((id, Some(finding))) => {
                    results.insert(id, finding);
                }
                Ok((id, None)) => warn!(item_id = %id, "item vanished from rubric"),
                Err(e) => warn!(error = %e, "item evaluation task failed"),
            }
        }
    };

    let timed_out = match run_timeout_ms {
        Some(ms) => tokio::time::timeout(Duration::from_millis(ms), collect)
            .await
            .is_err(),
        None => {
            collect.await;
            false
        }
    };
    if timed_out {
        join_set.abort_all();
    }

    (results, timed_out)
}
