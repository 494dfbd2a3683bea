//! Rubrica - rubric-driven review CLI
//!
//! The `rubrica` command audits an artifact against a weighted rubric and
//! prints the canonical review report on stdout.
//!
//! ## Commands
//!
//! - `review`: Audit an artifact and print the report
//! - `check`: Validate a rubric file without running an audit
//!
//! ## Exit codes
//!
//! - `0`: review completed without Blocker findings
//! - `1`: review completed with at least one Blocker
//! - `2`: the review could not run (bad rubric, unreadable artifact, ...)

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use rubrica_core::{
    run_audit, Artifact, FsArtifact, HttpOracle, HttpOracleConfig, HumanOracle, JudgmentOracle,
    RuleOracle, Rubric, RunConfig,
};

/// Per-attempt limit for the human oracle unless `--oracle-timeout` is set.
const HUMAN_ATTEMPT_TIMEOUT_SECS: u64 = 3600;

#[derive(Parser)]
#[command(name = "rubrica")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rubric-driven artifact review", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit an artifact against a rubric and print the report
    Review {
        /// Rubric file (TOML, or JSON with a .json extension)
        rubric: PathBuf,

        /// Artifact to review: a file or a directory
        artifact: PathBuf,

        /// Maximum items evaluated concurrently
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Whole-run timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Judgment oracle
        #[arg(long, value_enum, default_value_t = OracleKind::Rules)]
        oracle: OracleKind,

        /// Endpoint for the http oracle
        #[arg(long, env = "RUBRICA_ORACLE_URL")]
        oracle_url: Option<String>,

        /// Per-attempt oracle timeout in seconds
        #[arg(long)]
        oracle_timeout: Option<u64>,
    },

    /// Validate a rubric file
    Check {
        /// Rubric file (TOML, or JSON with a .json extension)
        rubric: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OracleKind {
    /// Deterministic per-item check rules from the rubric
    Rules,
    /// Ask a reviewer on the terminal
    Human,
    /// Model-backed judgment service
    Http,
}

/// Outcome of a command that ran to completion.
enum Verdict {
    Clean,
    Blocked,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    rubrica_core::init_tracing(cli.json, level);

    let result = match cli.command {
        Commands::Review {
            rubric,
            artifact,
            concurrency,
            timeout,
            oracle,
            oracle_url,
            oracle_timeout,
        } => {
            let options = ReviewOptions {
                concurrency,
                timeout,
                oracle,
                oracle_url,
                oracle_timeout,
            };
            cmd_review(&rubric, &artifact, options).await
        }
        Commands::Check { rubric } => cmd_check(&rubric),
    };

    match result {
        Ok(Verdict::Clean) => ExitCode::SUCCESS,
        Ok(Verdict::Blocked) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

struct ReviewOptions {
    concurrency: Option<usize>,
    timeout: Option<u64>,
    oracle: OracleKind,
    oracle_url: Option<String>,
    oracle_timeout: Option<u64>,
}

/// Build the run configuration: environment first, then flags.
fn run_config(options: &ReviewOptions) -> RunConfig {
    let mut config = RunConfig::from_env();
    if let Some(n) = options.concurrency {
        config = config.with_concurrency(n);
    }
    if let Some(secs) = options.timeout {
        config = config.with_run_timeout_ms(secs.saturating_mul(1000));
    }
    match (options.oracle_timeout, options.oracle) {
        (Some(secs), _) => config.retry.attempt_timeout_ms = secs.saturating_mul(1000),
        (None, OracleKind::Human) => {
            config.retry.attempt_timeout_ms = HUMAN_ATTEMPT_TIMEOUT_SECS * 1000
        }
        (None, _) => {}
    }
    config
}

fn build_oracle(options: &ReviewOptions, rubric: &Rubric) -> Result<Arc<dyn JudgmentOracle>> {
    let oracle: Arc<dyn JudgmentOracle> = match options.oracle {
        OracleKind::Rules => Arc::new(RuleOracle::from_rubric(rubric)),
        OracleKind::Human => Arc::new(HumanOracle::stdio()),
        OracleKind::Http => {
            let Some(url) = &options.oracle_url else {
                bail!("--oracle http requires --oracle-url (or RUBRICA_ORACLE_URL)");
            };
            let mut config = HttpOracleConfig::new(url);
            if let Some(secs) = options.oracle_timeout {
                config.request_timeout = Duration::from_secs(secs);
            }
            Arc::new(HttpOracle::new(config).context("Failed to set up http oracle")?)
        }
    };
    Ok(oracle)
}

/// Audit an artifact and print the report
async fn cmd_review(
    rubric_path: &Path,
    artifact_path: &Path,
    options: ReviewOptions,
) -> Result<Verdict> {
    let rubric = Rubric::load(rubric_path)
        .with_context(|| format!("Failed to load rubric {}", rubric_path.display()))?;
    let artifact = FsArtifact::open(artifact_path)
        .with_context(|| format!("Failed to open artifact {}", artifact_path.display()))?;

    let config = run_config(&options);
    let oracle = build_oracle(&options, &rubric)?;
    info!(
        rubric = %rubric.name(),
        artifact = %artifact.name(),
        oracle = oracle.name(),
        "starting review"
    );

    let outcome = run_audit(Arc::new(rubric), Arc::new(artifact), oracle, &config)
        .await
        .context("Review failed")?;

    print!("{}", outcome.report.to_markdown());

    if outcome.report.has_blockers() {
        Ok(Verdict::Blocked)
    } else {
        Ok(Verdict::Clean)
    }
}

/// Validate a rubric file
fn cmd_check(rubric_path: &Path) -> Result<Verdict> {
    let rubric = Rubric::load(rubric_path)
        .with_context(|| format!("Failed to load rubric {}", rubric_path.display()))?;

    println!("Rubric OK: {}", rubric.name());
    if let Some(version) = rubric.version() {
        println!("  Version:    {version}");
    }
    println!("  Dimensions: {}", rubric.dimensions().len());
    println!("  Items:      {}", rubric.item_count());
    println!("  Digest:     {}", rubric.digest());
    for dim in rubric.dimensions() {
        println!(
            "  - {} (weight {}, {} item(s))",
            dim.name,
            dim.weight,
            dim.items.len()
        );
    }
    Ok(Verdict::Clean)
}
