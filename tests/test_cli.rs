use assert_cmd::prelude::*;
#[allow(unused_imports)]
use predicates::prelude::*;

use std::process::Command;

#[test]
fn test_cli() {
    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.assert().failure();
}

#[test]
fn test_version() {
    let expected_version = "ossim 0.1.0\n";
    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.arg("--version")
        .assert()
        .stdout(expected_version);
}

#[test]
fn test_subcommand_version() {
    let expected = "argument '--version' which wasn't expected";

    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.arg("config")
        .arg("--version")
        .assert()
        .stderr(predicate::str::contains(expected));
}

#[test]
fn test_config_shows_defaults() {
    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("process_count: 50"))
        .stdout(predicate::str::contains("ram_capacity: 100"));
}

#[test]
fn test_preset_applies() {
    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    let output = cmd
        .args(&["--preset", "dual_cpu", "config"])
        .output()
        .expect("Calling binary failed");
    assert!(output.status.success());

    let merged: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(merged["experiment"]["cpu_count"].as_u64(), Some(2));
    assert_eq!(merged["experiment"]["ram_capacity"].as_u64(), Some(100));
}

#[test]
fn test_unknown_preset_fails() {
    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.args(&["--preset", "no_such_preset", "config"])
        .assert()
        .failure();
}

#[test]
fn test_run_summary() {
    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.args(&["run", "-n", "5", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"averageTime\""))
        .stdout(predicate::str::contains("\"totalProcesses\": 5"));
}

#[test]
fn test_run_env_override() {
    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.env("OSSIM_EXPERIMENT__PROCESS_COUNT", "4")
        .args(&["run", "--summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"totalProcesses\": 4"));
}

#[test]
fn test_run_rejects_bad_parameters() {
    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.args(&["run", "--cpu-count", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cpu_count must be positive"));
}

fn output_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("ossim-cli-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn read_json(path: std::path::PathBuf) -> serde_json::Value {
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {}", path.display(), e));
    serde_json::from_str(&text).unwrap()
}

#[test]
fn test_run_save_writes_files() {
    let dir = output_dir("run");

    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.env("OSSIM_OUTPUT_DIR", &dir)
        .args(&["run", "-n", "3", "--trace", "--save"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"numProcesses\": 3"));

    let result = read_json(dir.join("result.json"));
    assert_eq!(result["numProcesses"], 3);
    assert_eq!(result["outcome"], "completed");
    let snapshots = result["timeSeriesData"].as_array().unwrap().len();

    let trace = std::fs::read_to_string(dir.join("trace.csv")).unwrap();
    let lines: Vec<_> = trace.lines().collect();
    assert_eq!(lines[0], "time,memory_level,new,ready,running,waiting,terminated");
    assert_eq!(lines.len(), snapshots + 1);
    assert!(lines.last().unwrap().ends_with(",0,0,0,0,3"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_run_without_trace_saves_only_result() {
    let dir = output_dir("untraced");

    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.env("OSSIM_OUTPUT_DIR", &dir)
        .args(&["run", "-n", "2", "--save", "--summary"])
        .assert()
        .success();

    assert!(dir.join("result.json").exists());
    assert!(!dir.join("trace.csv").exists());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_sweep_writes_files() {
    let dir = output_dir("sweep");

    let mut cmd = Command::cargo_bin("ossim").expect("Calling binary failed");
    cmd.env("OSSIM_OUTPUT_DIR", &dir)
        .args(&["sweep", "-q"])
        .assert()
        .success()
        // no per-group overview
        .stdout(predicate::str::contains("ram_200      25:").not());

    let results = read_json(dir.join("sweep.json"));
    let groups: Vec<_> = results.as_object().unwrap().keys().cloned().collect();
    assert_eq!(
        groups,
        vec!["dual_cpu", "fast_cpu", "interval_1", "interval_10", "interval_5", "ram_200"]
    );

    let table = std::fs::read_to_string(dir.join("sweep.csv")).unwrap();
    let mut lines = table.lines();
    assert_eq!(
        lines.next(),
        Some("group,num_processes,average_time,standard_deviation,completed,outcome,end_time")
    );
    assert_eq!(lines.count(), 6 * 5);

    let intervals = read_json(dir.join("intervals.json"));
    assert_eq!(intervals["series"].as_array().unwrap().len(), 3);
    assert_eq!(intervals["series"][0]["name"], "Interval 10");

    let strategies = read_json(dir.join("strategies.json"));
    let names: Vec<_> = strategies["series"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(names.len(), 4);
    assert!(names[0].starts_with("Normal"));
    for series in strategies["series"].as_array().unwrap() {
        assert_eq!(series["data"].as_array().unwrap().len(), 5);
    }

    std::fs::remove_dir_all(&dir).unwrap();
}
