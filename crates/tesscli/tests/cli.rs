//! Runs the binary against a library in a scratch directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const LIBRARY: &str = r#"{
  "songs": [
    {"composer": "Franz Schubert", "title": "Heidenröslein", "filename": "heiden.mxl",
     "tessituragram": {"62": 6.0, "64": 5.0, "66": 2.0, "67": 1.0}},
    {"composer": "Robert Schumann", "title": "Widmung", "filename": "widmung.mxl",
     "tessituragram": {"60": 4.0, "61": 3.0, "65": 1.0}},
    {"composer": "Nobody", "title": "Broken", "filename": "broken.mxl",
     "tessituragram": {}}
  ]
}"#;

fn scratch() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("library.json"), LIBRARY).unwrap();
    dir
}

fn tesscli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tesscli").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env_remove("RUST_LOG")
        .env_remove("TESSITURA_LIBRARY")
        .env_remove("TESSITURA_ALPHA")
        .env("TESSITURA_LOG_LEVEL", "warn")
        .arg("--library")
        .arg(dir.join("library.json"));
    cmd
}

#[test]
fn recommend_ranks_and_writes_output() {
    let dir = scratch();
    let output = dir.path().join("out").join("recs.json");

    tesscli(dir.path())
        .args(["recommend", "--low", "60", "--high", "67", "--favorite", "62,64", "--avoid", "60"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("1. heiden.mxl"))
        .stdout(predicate::str::contains("Saved 2 recommendations"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(saved["recommendations"][0]["filename"], "heiden.mxl");
    assert_eq!(saved["recommendations"][1]["rank"], 2);
    assert_eq!(saved["user_preferences"]["range"]["low_midi"], 60);
}

#[test]
fn recommend_rejects_overlapping_preferences() {
    let dir = scratch();
    tesscli(dir.path())
        .args(["recommend", "--low", "60", "--high", "67", "--favorite", "62", "--avoid", "62"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid preferences"));
}

#[test]
fn query_filters_by_composer() {
    let dir = scratch();
    tesscli(dir.path())
        .args(["query", "--composer", "schubert"])
        .assert()
        .success()
        .stdout(predicate::str::contains("heiden.mxl"))
        .stdout(predicate::str::contains("widmung.mxl").not())
        .stdout(predicate::str::contains("1 of 2 songs match"));
}

#[test]
fn merge_adds_only_new_filenames() {
    let dir = scratch();
    let extra = dir.path().join("extra.json");
    std::fs::write(
        &extra,
        r#"{"songs": [
            {"composer": "X", "title": "Again", "filename": "widmung.mxl", "tessituragram": {"70": 1.0}},
            {"composer": "Y", "title": "New", "filename": "new.mxl", "tessituragram": {"70": 1.0}}
        ]}"#,
    )
    .unwrap();

    tesscli(dir.path())
        .arg("merge")
        .arg(&extra)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 1 of 2 songs"));

    let merged: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("library.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(merged["songs"].as_array().unwrap().len(), 4);
}

#[test]
fn evaluate_retrieval_writes_report() {
    let dir = scratch();
    let results = dir.path().join("results");

    tesscli(dir.path())
        .env("TESSITURA_BOOTSTRAP_RESAMPLES", "200")
        .args(["evaluate", "retrieval", "--results-dir"])
        .arg(&results)
        .assert()
        .success()
        .stdout(predicate::str::contains("MRR"));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(results.join("RQ1_results.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(report["data_summary"]["invalid_songs"], 1);
    assert_eq!(report["parameters"]["bootstrap_resamples"], 200);
}

#[test]
fn config_shows_effective_values() {
    let dir = scratch();
    std::fs::write(dir.path().join("tessitura.toml"), "[scoring]\nalpha = 0.75\n").unwrap();

    tesscli(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha = 0.75"))
        .stdout(predicate::str::contains("# loaded: tessitura.toml"));
}

#[test]
fn recommend_accepts_profile_file() {
    let dir = scratch();
    let profile = dir.path().join("profile.json");
    std::fs::write(
        &profile,
        r#"{"range": {"low_midi": 60, "high_midi": 67}, "favorite_notes": [62, 64], "avoid_notes": [60]}"#,
    )
    .unwrap();

    tesscli(dir.path())
        .arg("recommend")
        .arg("--profile")
        .arg(&profile)
        .args(["--top", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. heiden.mxl"))
        .stdout(predicate::str::contains("widmung.mxl").not());
}

#[test]
fn recommend_reports_malformed_profile_file() {
    let dir = scratch();
    let profile = dir.path().join("profile.json");
    std::fs::write(
        &profile,
        r#"{"range": {"low_midi": 60, "high_midi": 67}, "favorite_notes": [90]}"#,
    )
    .unwrap();

    tesscli(dir.path())
        .arg("recommend")
        .arg("--profile")
        .arg(&profile)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed profile"));
}
