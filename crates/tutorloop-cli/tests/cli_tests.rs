//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const QUIZ_DIR: &str = "../../quizzes";
const ALGEBRA_1: &str = "../../quizzes/algebra-week1.json";
const ALGEBRA_2: &str = "../../quizzes/algebra-week2.json";
const GEOMETRY_1: &str = "../../quizzes/geometry-week1.json";
const GEOMETRY_QA: &str = "../../qa-results/geometry-week1.json";

fn tutorloop() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("tutorloop").unwrap();
    cmd.env_remove("TUTORLOOP_ALPHA")
        .env_remove("TUTORLOOP_STORE")
        .env_remove("TUTORLOOP_USER");
    cmd
}

/// Temp dir holding a config whose store lives inside the dir.
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("data").join("samples.jsonl");
    let config = dir.path().join("tutorloop.toml");
    std::fs::write(
        &config,
        format!(
            "alpha = 0.5\ndefault_user = \"student-1\"\nstore_path = {:?}\n",
            store.display().to_string()
        ),
    )
    .unwrap();
    (dir, config)
}

fn record(config: &Path, quiz: &str) {
    tutorloop()
        .arg("--config")
        .arg(config)
        .args(["record", "--quiz", quiz])
        .assert()
        .success();
}

fn json_stdout(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "command failed: {output:?}");
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn help_output() {
    tutorloop()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Quiz mastery tracker and adaptive tutor"));
}

#[test]
fn version_output() {
    tutorloop()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tutorloop"));
}

#[test]
fn validate_sample_quizzes() {
    tutorloop()
        .args(["validate", "--quiz", QUIZ_DIR])
        .assert()
        .success()
        .stdout(predicate::str::contains("algebra"))
        .stdout(predicate::str::contains("geometry"))
        .stdout(predicate::str::contains("All 3 quiz file(s) valid"));
}

#[test]
fn validate_rejects_empty_quiz() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.json");
    std::fs::write(
        &path,
        r#"{"user_id": "u1", "topic_id": "algebra", "timestamp": "2025-01-01T00:00:00",
            "difficulty": "easy", "questions": []}"#,
    )
    .unwrap();

    tutorloop()
        .arg("validate")
        .arg("--quiz")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("INVALID"))
        .stdout(predicate::str::contains("questions"))
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn validate_nonexistent_file() {
    tutorloop()
        .args(["validate", "--quiz", "nonexistent.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn record_and_show_progress() {
    let (_dir, config) = workspace();
    record(&config, ALGEBRA_1);

    tutorloop()
        .arg("--config")
        .arg(&config)
        .args(["record", "--quiz", ALGEBRA_2])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 5 correct"))
        .stdout(predicate::str::contains("topic mastery: 40.0%"));

    tutorloop()
        .arg("--config")
        .arg(&config)
        .arg("progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("algebra"))
        .stdout(predicate::str::contains("40.0%"));
}

#[test]
fn record_with_qa_fuses_scores() {
    let (_dir, config) = workspace();

    let outcome = json_stdout(
        tutorloop()
            .arg("--config")
            .arg(&config)
            .args(["record", "--quiz", GEOMETRY_1, "--qa", GEOMETRY_QA, "--json"]),
    );
    let quiz_score = outcome["quiz_score"].as_f64().unwrap();
    let sample_score = outcome["sample"]["score"].as_f64().unwrap();
    assert!((quiz_score - 0.8).abs() < 1e-9);
    assert!((sample_score - 0.83).abs() < 1e-9);
}

#[test]
fn record_rejects_other_user() {
    let (_dir, config) = workspace();

    tutorloop()
        .arg("--config")
        .arg(&config)
        .args(["--user", "someone-else", "record", "--quiz", ALGEBRA_1])
        .assert()
        .failure()
        .stderr(predicate::str::contains("student-1"));
}

#[test]
fn empty_store_has_nothing_to_recommend() {
    let (_dir, config) = workspace();

    tutorloop()
        .arg("--config")
        .arg(&config)
        .arg("progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("No quizzes recorded"));

    let step = json_stdout(tutorloop().arg("--config").arg(&config).args(["next", "--json"]));
    assert_eq!(step["status"], "nothing_to_recommend");
}

#[test]
fn next_recommends_weakest_topic() {
    let (_dir, config) = workspace();
    record(&config, ALGEBRA_1);
    record(&config, GEOMETRY_1);

    let step = json_stdout(tutorloop().arg("--config").arg(&config).args(["next", "--json"]));
    assert_eq!(step["status"], "recommend");
    assert_eq!(step["next_topic_id"], "algebra");
    assert_eq!(step["action_type"], "review_basics");
    assert_eq!(step["difficulty"], "easy");
}

#[test]
fn difficulty_for_unseen_topic_is_medium() {
    let (_dir, config) = workspace();
    record(&config, ALGEBRA_1);

    tutorloop()
        .arg("--config")
        .arg(&config)
        .args(["difficulty", "--topic", "calculus"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 (medium)"));

    tutorloop()
        .arg("--config")
        .arg(&config)
        .args(["difficulty", "--topic", "algebra"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 (easy)"));
}

#[test]
fn curve_and_history() {
    let (_dir, config) = workspace();
    record(&config, ALGEBRA_2);
    record(&config, ALGEBRA_1);

    tutorloop()
        .arg("--config")
        .arg(&config)
        .args(["curve", "--topic", "algebra"])
        .assert()
        .success()
        .stdout(predicate::str::contains("60.0%"))
        .stdout(predicate::str::contains("40.0%"));

    tutorloop()
        .arg("--config")
        .arg(&config)
        .args(["history", "--topic", "algebra", "--by-time"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-01-06 09:00:00"))
        .stdout(predicate::str::contains("2025-01-13 09:00:00"));
}

#[test]
fn snapshot_and_compare() {
    let (dir, config) = workspace();
    let baseline = dir.path().join("baseline.json");
    let current = dir.path().join("current.json");
    let html = dir.path().join("report.html");

    record(&config, ALGEBRA_1);
    tutorloop()
        .arg("--config")
        .arg(&config)
        .arg("snapshot")
        .arg("--output")
        .arg(&baseline)
        .assert()
        .success();

    record(&config, ALGEBRA_2);
    tutorloop()
        .arg("--config")
        .arg(&config)
        .arg("snapshot")
        .arg("--output")
        .arg(&current)
        .arg("--html")
        .arg(&html)
        .arg("--markdown")
        .assert()
        .success()
        .stdout(predicate::str::contains("## Progress for student-1"));

    assert!(std::fs::read_to_string(&html).unwrap().contains("<html"));

    let delta = json_stdout(
        tutorloop()
            .arg("compare")
            .arg("--baseline")
            .arg(&baseline)
            .arg("--current")
            .arg(&current)
            .args(["--format", "json"]),
    );
    assert_eq!(delta["improvements"][0]["topic_id"], "algebra");
    assert_eq!(delta["regressions"].as_array().unwrap().len(), 0);

    // Swapped, the improvement becomes a regression.
    tutorloop()
        .arg("compare")
        .arg("--baseline")
        .arg(&current)
        .arg("--current")
        .arg(&baseline)
        .arg("--fail-on-regression")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Regressions"));
}

#[test]
fn compare_nonexistent_snapshot() {
    tutorloop()
        .args([
            "compare",
            "--baseline",
            "no_such_file.json",
            "--current",
            "also_no_file.json",
        ])
        .assert()
        .failure();
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    tutorloop()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created tutorloop.toml"))
        .stdout(predicate::str::contains("Created quizzes/example.json"));

    assert!(dir.path().join("tutorloop.toml").exists());
    assert!(dir.path().join("quizzes/example.json").exists());

    tutorloop()
        .current_dir(dir.path())
        .args(["validate", "--quiz", "quizzes/example.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 questions"));

    tutorloop()
        .current_dir(dir.path())
        .args(["record", "--quiz", "quizzes/example.json"])
        .assert()
        .success();
    assert!(dir.path().join("tutorloop-data/samples.jsonl").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    tutorloop().current_dir(dir.path()).arg("init").assert().success();

    tutorloop()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}
