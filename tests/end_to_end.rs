use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use colocgraph::processors::run_batch;
use colocgraph::{AppConfig, PlotConfig};
use tempfile::TempDir;

fn write_sample(dir: &Path) -> PathBuf {
    let path = dir.join("sample.txt");
    fs::write(
        &path,
        b"Line profile 1\nDistance\tA\tB\tC\n0.0\t10\t20\t30\n0.5\t12\t18\t33\n",
    )
    .unwrap();
    path
}

fn write_utf16(dir: &Path, name: &str) -> PathBuf {
    let text = "Line profile 2\nDistance\tA\tB\tC\n0.0\t1\t2\t3\n";
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn config_with_output(out: &Path) -> AppConfig {
    AppConfig {
        plot: PlotConfig {
            output_dir: Some(out.to_path_buf()),
            column_order: "312".to_string(),
            ..PlotConfig::default()
        },
        ..AppConfig::default()
    }
}

#[test]
fn sample_file_produces_one_image_with_three_series() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_sample(input.path());

    let report = run_batch(input.path(), &config_with_output(out.path()), false).unwrap();

    assert_eq!(report.rendered, vec![out.path().join("sample.svg")]);
    assert!(report.load_failures.is_empty());
    assert!(report.render_failures.is_empty());

    let entries: Vec<_> = fs::read_dir(out.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);

    let svg = fs::read_to_string(out.path().join("sample.svg")).unwrap().to_lowercase();
    let c = svg.find("#0000ff").unwrap();
    let a = svg.find("#ff0000").unwrap();
    let b = svg.find("#008000").unwrap();
    assert!(c < a && a < b, "series must be drawn in order C, A, B");
}

#[test]
fn corrupt_file_is_reported_and_valid_file_still_plotted() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_sample(input.path());
    let corrupt = write_utf16(input.path(), "corrupt.txt");

    let report = run_batch(input.path(), &config_with_output(out.path()), false).unwrap();

    assert_eq!(report.discovered.len(), 2);
    assert_eq!(report.rendered, vec![out.path().join("sample.svg")]);
    assert_eq!(report.load_failures.len(), 1);
    assert_eq!(report.load_failures[0].0, corrupt);
    assert!(!out.path().join("corrupt.svg").exists());
}

#[test]
fn directory_without_matching_files_produces_nothing() {
    let input = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(input.path().join("notes.csv"), "a,b\n1,2\n").unwrap();

    let report = run_batch(input.path(), &config_with_output(out.path()), false).unwrap();

    assert!(report.discovered.is_empty());
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn binary_writes_into_working_directory() {
    let input = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_sample(input.path());
    write_utf16(input.path(), "corrupt.txt");

    let status = Command::new(env!("CARGO_BIN_EXE_colocgraph"))
        .arg(input.path())
        .args(["--order", "312", "--legend", "true"])
        .current_dir(work.path())
        .status()
        .unwrap();

    assert!(status.success(), "per-file load errors must not fail the run");
    assert!(work.path().join("sample.svg").exists());
    assert!(!work.path().join("corrupt.svg").exists());
}

#[test]
fn binary_rejects_unknown_image_format() {
    let input = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    write_sample(input.path());

    let status = Command::new(env!("CARGO_BIN_EXE_colocgraph"))
        .arg(input.path())
        .args(["--image_data_type", "webp"])
        .current_dir(work.path())
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(2));
    assert_eq!(fs::read_dir(work.path()).unwrap().count(), 0);
}
