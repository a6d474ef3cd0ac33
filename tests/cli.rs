use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use tempfile::TempDir;

fn write_jpeg(path: &Path) {
    RgbImage::from_pixel(10, 10, Rgb([200, 40, 90])).save(path).unwrap();
}

fn blurbatch() -> Command {
    let mut cmd = Command::cargo_bin("blurbatch").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_reports_tally_and_writes_outputs() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("a.jpg"));
    fs::write(dir.path().join("b.jpg"), b"").unwrap();
    write_jpeg(&dir.path().join("c.jpg"));

    blurbatch()
        .arg("--input")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting processing of 3 images"))
        .stdout(predicate::str::contains("2/3 images processed correctly"))
        .stderr(predicate::str::contains("b.jpg"));

    assert!(dir.path().join("out/output_a.jpg").is_file());
    assert!(dir.path().join("out/output_c.jpg").is_file());
}

#[test]
fn test_empty_directory_succeeds() {
    let dir = TempDir::new().unwrap();

    blurbatch()
        .args(["--quiet", "--input"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0/0 images processed correctly"));
}

#[test]
fn test_missing_input_fails() {
    let dir = TempDir::new().unwrap();

    blurbatch()
        .arg("--input")
        .arg(dir.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot list images"));
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    write_jpeg(&dir.path().join("only.jpg"));

    let output = blurbatch()
        .args(["--json", "--threads", "2", "--input"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["total"], 1);
}

#[test]
fn test_invalid_quality_rejected() {
    let dir = TempDir::new().unwrap();

    blurbatch()
        .args(["--quality", "0", "--input"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quality must be between 1 and 100"));
}

#[test]
fn test_config_file_with_flag_override() {
    let dir = TempDir::new().unwrap();
    let images = dir.path().join("images");
    fs::create_dir(&images).unwrap();
    write_jpeg(&images.join("x.jpg"));

    let config_path = dir.path().join("blurbatch.toml");
    blurbatch()
        .args(["example-config", "--output"])
        .arg(&config_path)
        .assert()
        .success();
    assert!(config_path.is_file());

    blurbatch()
        .arg("--config")
        .arg(&config_path)
        .arg("--input")
        .arg(&images)
        .arg("--output")
        .arg(dir.path().join("blurred"))
        .args(["--blur", "box"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1/1 images processed correctly"));

    assert!(dir.path().join("blurred/output_x.jpg").is_file());
}
