//! Run configuration.
//!
//! Defaults, overridden by environment variables, overridden in turn by
//! command-line flags in the binary.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::evaluator::RetryPolicy;
use crate::locator::LocateOptions;

pub const CONCURRENCY_ENV: &str = "RUBRICA_CONCURRENCY";
pub const TIMEOUT_ENV: &str = "RUBRICA_TIMEOUT_SECS";
pub const ORACLE_TIMEOUT_ENV: &str = "RUBRICA_ORACLE_TIMEOUT_SECS";

/// Settings for one audit run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Maximum items evaluated at once. Never below 1.
    pub concurrency: usize,
    /// Whole-run deadline (milliseconds); items still pending become Unknown.
    pub run_timeout_ms: Option<u64>,
    pub retry: RetryPolicy,
    pub locate: LocateOptions,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            run_timeout_ms: None,
            retry: RetryPolicy::default(),
            locate: LocateOptions::default(),
        }
    }
}

impl RunConfig {
    /// Defaults overridden by `RUBRICA_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unparseable values are
    /// ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(n) = parse_var::<usize>(&lookup, CONCURRENCY_ENV) {
            config = config.with_concurrency(n);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, TIMEOUT_ENV) {
            config.run_timeout_ms = Some(secs.saturating_mul(1000));
        }
        if let Some(secs) = parse_var::<u64>(&lookup, ORACLE_TIMEOUT_ENV) {
            config.retry.attempt_timeout_ms = secs.saturating_mul(1000);
        }
        config
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_run_timeout_ms(mut self, ms: u64) -> Self {
        self.run_timeout_ms = Some(ms);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
