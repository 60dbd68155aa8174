use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use serial_test::serial;
use std::process::Command;

fn fixture() -> String {
  format!("{}/tests/fixtures/patents_output.json", env!("CARGO_MANIFEST_DIR"))
}

/// `patents` run from a scratch directory against the fixture dataset
fn patents_cmd(dir: &assert_fs::TempDir) -> Command {
  let mut cmd = Command::cargo_bin("patents").expect("binary exists");
  cmd.current_dir(dir.path());
  cmd.env_remove("PATENTS_CONFIG");
  cmd.env_remove("RUST_LOG");
  cmd.env("PATENTS_SOURCE", fixture());
  cmd
}

#[test]
fn test_dashboard_shows_totals_and_keywords() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp)
    .arg("dashboard")
    .assert()
    .success()
    .stdout(contains("Total patents:  24").and(contains("Total clusters: 4")).and(contains("sensor")));

  temp.close().unwrap();
}

#[test]
fn test_dashboard_json() {
  let temp = assert_fs::TempDir::new().unwrap();

  let output = patents_cmd(&temp).args(["--json", "dashboard"]).output().unwrap();
  assert!(output.status.success());

  let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(summary["total_patents"], 24);
  assert_eq!(summary["top_keywords"][0]["keyword"], "sensor");
  assert_eq!(summary["top_keywords"][0]["count"], 9);
}

#[test]
fn test_empty_dataset_falls_back_to_no_data() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp.child("empty.json").write_str("[]").unwrap();

  patents_cmd(&temp)
    .args(["--source", "empty.json", "dashboard"])
    .assert()
    .success()
    .stdout(contains("No data available"));
}

#[test]
fn test_dashboard_keeps_counts_when_keywords_are_missing() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp.child("bare.json").write_str(r#"[{"No": 1, "Title": "A"}]"#).unwrap();

  patents_cmd(&temp)
    .args(["--source", "bare.json", "dashboard"])
    .assert()
    .success()
    .stdout(
      contains("Total patents:  1")
        .and(contains("Total clusters: No data available"))
        .and(contains("Top keywords\n  No data available")),
    );
}

#[test]
fn test_keywords_limit_keeps_most_frequent() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp
    .child("ranked.json")
    .write_str(
      r#"[
        {"No": 1, "keywords": ["rare", "common"]},
        {"No": 2, "keywords": ["common"]},
        {"No": 3, "keywords": ["common"]}
      ]"#,
    )
    .unwrap();

  patents_cmd(&temp)
    .args(["--source", "ranked.json", "keywords", "--limit", "1"])
    .assert()
    .success()
    .stdout(contains("common(3)").and(contains("rare").not()));
}

#[test]
fn test_clusters_lists_unassigned_and_members() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp)
    .args(["clusters", "--id", "3"])
    .assert()
    .success()
    .stdout(
      contains("Battery Systems")
        .and(contains("Unassigned"))
        .and(contains("Patents per year"))
        .and(contains("Flexible OLED Panel")),
    );

  patents_cmd(&temp).args(["clusters", "--id", "42"]).assert().failure().stderr(contains("Cluster 42 not found"));
}

#[test]
fn test_list_filters_by_flags() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp)
    .args(["list", "--cluster", "Display Panels", "--year", "2020"])
    .assert()
    .success()
    .stdout(contains("Quantum Dot Color Conversion Film").and(contains("Flexible OLED Panel").not()));

  patents_cmd(&temp)
    .args(["list", "--country", "FR"])
    .assert()
    .success()
    .stdout(contains("No patents match the selected filters."));
}

#[test]
fn test_list_filter_json_and_flag_precedence() {
  let temp = assert_fs::TempDir::new().unwrap();

  let output = patents_cmd(&temp)
    .args(["--json", "list", "--filter-json", r#"{"country": "KR", "cluster": "Battery Systems"}"#])
    .output()
    .unwrap();
  let patents: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(patents.len(), 2);

  let output = patents_cmd(&temp)
    .args(["--json", "list", "--filter-json", r#"{"country": "KR"}"#, "--country", "JP"])
    .output()
    .unwrap();
  let patents: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(patents.len(), 3);
  assert!(patents.iter().all(|p| p["country"] == "JP"));

  patents_cmd(&temp).args(["list", "--filter-json", "{ nope"]).assert().failure().stderr(contains("Invalid filter JSON"));
}

#[test]
fn test_list_search_and_facets() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp)
    .args(["list", "--compact", "--facets", "--search", "smart"])
    .assert()
    .success()
    .stdout(
      contains("Available filters")
        .and(contains("2016, 2017, 2018, 2019, 2020, 2021"))
        .and(contains("Smart Ring for Health Monitoring"))
        .and(contains("Smartwatch Gesture Recognition"))
        .and(contains("Battery Thermal Management System").not()),
    );
}

#[test]
fn test_show_patent_detail() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp)
    .args(["show", "6"])
    .assert()
    .success()
    .stdout(
      contains("Solid State Battery Electrolyte")
        .and(contains("Country: JP"))
        .and(contains("Similar Patents"))
        .and(contains("Cathode Coating for High Voltage Cells")),
    );

  patents_cmd(&temp).args(["show", "999"]).assert().failure().stderr(contains("Patent 999 not found"));
}

#[test]
fn test_keywords_drill_down() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp)
    .args(["keywords", "--cluster", "Battery Systems", "--keyword", "lithium"])
    .assert()
    .success()
    .stdout(
      contains("Keywords: Battery Systems")
        .and(contains("battery(4)"))
        .and(contains("Fast Charging Protocol for Lithium Cells"))
        .and(contains("Cathode Coating").not()),
    );
}

#[test]
fn test_predict_from_text() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp)
    .args(["predict", "A wearable sensor tracking ambient light"])
    .assert()
    .success()
    .stdout(contains("Predicted Cluster:").and(contains("wearable, sensor")).and(contains("repeated submissions")));
}

#[test]
fn test_predict_rejects_empty_and_wrong_file() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp.child("abstract.pdf").write_str("not really a pdf").unwrap();

  patents_cmd(&temp)
    .args(["predict", "   "])
    .assert()
    .failure()
    .stderr(contains("Please enter or upload an abstract"));

  patents_cmd(&temp)
    .args(["predict", "--file", "abstract.pdf"])
    .assert()
    .failure()
    .stderr(contains("please upload a .txt file"));
}

#[test]
fn test_predict_from_uploaded_file() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp.child("abstract.txt").write_str("A battery cooling plate for lithium cells").unwrap();

  let output = patents_cmd(&temp).args(["--json", "predict", "--file", "abstract.txt"]).output().unwrap();
  assert!(output.status.success());

  let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(result["keywords"], serde_json::json!(["battery", "cooling", "plate", "lithium", "cells"]));
  assert!(result["similar_patents"].as_array().unwrap().len() <= 3);
}

#[test]
fn test_missing_source_fails_with_message() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp)
    .args(["--source", "nowhere.json", "dashboard"])
    .assert()
    .failure()
    .stderr(contains("Failed to load patent data from nowhere.json"));

  patents_cmd(&temp)
    .args(["--source", "nowhere.json", "predict", "some abstract text"])
    .assert()
    .failure()
    .stderr(contains("Prediction failed"));
}

#[test]
fn test_about() {
  let temp = assert_fs::TempDir::new().unwrap();

  patents_cmd(&temp).arg("about").assert().success().stdout(contains("pre-computed patent clustering dataset"));
}

#[test]
#[serial]
fn test_theme_toggle_persists() {
  let temp = assert_fs::TempDir::new().unwrap();
  let config = temp.child("patents.json");

  patents_cmd(&temp).args(["theme", "--toggle"]).assert().success().stdout(contains("Theme: dark"));
  config.assert(predicate::str::contains("\"dark\""));
  // The environment override is not written back
  config.assert(predicate::str::contains("patents_output.json").and(predicate::str::contains("fixtures").not()));

  patents_cmd(&temp).arg("theme").assert().success().stdout(contains("Theme: dark"));
  patents_cmd(&temp).args(["theme", "--toggle"]).assert().success().stdout(contains("Theme: light"));
}
