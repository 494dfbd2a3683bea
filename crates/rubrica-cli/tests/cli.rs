use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

const RUBRIC: &str = r#"
name = "cli-demo"

[[dimensions]]
name = "Markup"
weight = 1.0

[[dimensions.items]]
id = "title"
description = "Page has a title"
markers = ["<title>"]
check = { require = ["<title>.+</title>"] }

[[dimensions.items]]
id = "todo"
description = "No TODO markers remain"
severity = "blocker"
markers = ["<body", "TODO"]
check = { forbid = ["TODO"] }
"#;

const CLEAN_PAGE: &str = "<html>\n<title>Shop</title>\n<body>\n<p>Welcome</p>\n</body>\n</html>\n";
const DIRTY_PAGE: &str =
    "<html>\n<title>Shop</title>\n<body>\n<p>TODO: pricing</p>\n</body>\n</html>\n";

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("rubrica").unwrap();
    cmd.env_remove("RUBRICA_ORACLE_URL")
        .env_remove("RUBRICA_CONCURRENCY")
        .env_remove("RUBRICA_TIMEOUT_SECS");
    cmd
}

fn workspace(page: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("rubric.toml"), RUBRIC).unwrap();
    fs::create_dir(dir.path().join("site")).unwrap();
    fs::write(dir.path().join("site/index.html"), page).unwrap();
    dir
}

fn review(dir: &Path) -> Command {
    let mut c = cmd();
    c.arg("review")
        .arg(dir.join("rubric.toml"))
        .arg(dir.join("site"));
    c
}

#[test]
fn review_clean_artifact_exits_zero() {
    let dir = workspace(CLEAN_PAGE);
    review(dir.path())
        .assert()
        .success()
        .stdout(contains("## QA Review Results"))
        .stdout(contains("### Score: 10.0/10"))
        .stdout(contains("### Blockers (must fix)\n### High Priority\n"));
}

#[test]
fn review_with_blocker_exits_one() {
    let dir = workspace(DIRTY_PAGE);
    review(dir.path())
        .args(["--oracle", "rules", "--concurrency", "1"])
        .assert()
        .code(1)
        .stdout(contains(
            "### Blockers (must fix)\n- No TODO markers remain | index.html:3-4\n",
        ))
        .stdout(contains("### Score: 5.0/10"));
}

#[test]
fn review_invalid_rubric_exits_two() {
    let dir = workspace(CLEAN_PAGE);
    fs::write(
        dir.path().join("rubric.toml"),
        "[[dimensions]]\nname = \"Unweighted\"\n",
    )
    .unwrap();
    review(dir.path())
        .assert()
        .code(2)
        .stderr(contains("error: Failed to load rubric"))
        .stderr(contains("has no explicit weight"));
}

#[test]
fn review_missing_artifact_exits_two() {
    let dir = workspace(CLEAN_PAGE);
    cmd()
        .arg("review")
        .arg(dir.path().join("rubric.toml"))
        .arg(dir.path().join("absent"))
        .assert()
        .code(2)
        .stderr(contains("Failed to open artifact"));
}

#[test]
fn http_oracle_requires_url() {
    let dir = workspace(CLEAN_PAGE);
    review(dir.path())
        .args(["--oracle", "http"])
        .assert()
        .code(2)
        .stderr(contains("--oracle-url"));
}

#[test]
fn check_reports_rubric_summary() {
    let dir = workspace(CLEAN_PAGE);
    cmd()
        .arg("check")
        .arg(dir.path().join("rubric.toml"))
        .assert()
        .success()
        .stdout(contains("Rubric OK: cli-demo"))
        .stdout(contains("Items:      2"));
}
