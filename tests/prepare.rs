//! E2E tests driving the binary over the sample statements.

use std::path::PathBuf;
use std::process::{Command, Output};

const METADATA: &str = r#"{"PAN":"ABCDE1234F","Name":"A Filer"}"#;

fn out_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("itrprep_e2e_{name}"));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn prepare(ais: &str, out: &PathBuf, extra: &[&str]) -> Output {
    Command::new("cargo")
        .args([
            "run",
            "--quiet",
            "--",
            "prepare",
            "--form16",
            "tests/data/form16_sample.csv",
            "--ais",
            ais,
            "--tis",
            "tests/data/tis_sample.csv",
            "--brokerage",
            "tests/data/brokerage_sample.csv",
            "--out",
            out.to_str().unwrap(),
            "--metadata",
            METADATA,
        ])
        .args(extra)
        .output()
        .expect("failed to execute command")
}

#[test]
fn full_pipeline_totals() {
    let out = out_dir("totals");
    let output = prepare("tests/data/ais_sample.csv", &out, &[]);
    assert!(output.status.success(), "command failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Slab base: 14,74,500 ordinary + 30,000 F&O - 2,77,400 deductions
    // (80C capped at 1,50,000).
    assert!(stdout.contains("Taxable Income (slab base)"));
    assert!(stdout.contains("1227100"));
    // Slab 1,80,630 + STCG 6,750 + LTCG 5,000 + cess = 2,00,075 rounded.
    assert!(stdout.contains("Total Tax Payable"));
    assert!(stdout.contains("200075"));
    // TDS 95,000 + advance tax 20,000 offset.
    assert!(stdout.contains("Net Tax Payable/Refund"));
    assert!(stdout.contains("85075"));
    // Intraday loss reported signed.
    assert!(stdout.contains("Speculative (signed, set-off manual)"));
    assert!(stdout.contains("-12000"));
}

#[test]
fn sheets_written_one_per_source() {
    let out = out_dir("sheets");
    let output = prepare("tests/data/ais_sample.csv", &out, &[]);
    assert!(output.status.success(), "command failed: {output:?}");

    for sheet in ["Summary", "Form16", "AIS", "TIS", "Brokerage"] {
        let path = out.join(format!("{sheet}.csv"));
        assert!(path.exists(), "missing sheet {}", path.display());
    }
    let summary = std::fs::read_to_string(out.join("Summary.csv")).unwrap();
    assert!(summary.starts_with("Metric,Amount"));
    assert!(summary.contains("Net Tax Payable/Refund"));
}

#[test]
fn malformed_row_warned_and_excluded() {
    let out = out_dir("warnings");
    let output = prepare("tests/data/ais_bad_amount.csv", &out, &[]);
    assert!(output.status.success(), "command failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("WARNINGS (1)"));
    assert!(stdout.contains("AIS row 6: malformed record: abc"));
    // Totals unchanged: the bad row is excluded, not partially counted.
    assert!(stdout.contains("200075"));
    assert!(out.join("Warnings.csv").exists());
}

#[test]
fn json_output_parses() {
    let out = out_dir("json");
    let output = prepare("tests/data/ais_sample.csv", &out, &["--json"]);
    assert!(output.status.success(), "command failed: {output:?}");

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["metadata"]["pan"], "ABCDE1234F");
    assert_eq!(json["buckets"]["speculative"], "-12000");
    assert_eq!(json["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn missing_metadata_is_fatal() {
    let out = out_dir("no_metadata");
    let output = Command::new("cargo")
        .args([
            "run",
            "--quiet",
            "--",
            "prepare",
            "--form16",
            "tests/data/form16_sample.csv",
            "--ais",
            "tests/data/ais_sample.csv",
            "--tis",
            "tests/data/tis_sample.csv",
            "--brokerage",
            "tests/data/brokerage_sample.csv",
            "--out",
            out.to_str().unwrap(),
        ])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required metadata key"));
}

#[test]
fn empty_source_is_fatal_and_explains_why() {
    let out = out_dir("empty_source");
    let output = Command::new("cargo")
        .args([
            "run",
            "--quiet",
            "--",
            "prepare",
            "--form16",
            "tests/data/form16_wrong_columns.csv",
            "--ais",
            "tests/data/ais_sample.csv",
            "--tis",
            "tests/data/tis_sample.csv",
            "--brokerage",
            "tests/data/brokerage_sample.csv",
            "--out",
            out.to_str().unwrap(),
            "--metadata",
            METADATA,
        ])
        .output()
        .expect("failed to execute command");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    // The abort names the source and carries the collected warnings, so
    // the unmatched-header diagnostic reaches the user.
    assert!(stderr.contains("no usable rows for mandatory source Form16"));
    assert!(stderr.contains("required column not found"));
    assert!(!out.join("Summary.csv").exists());
}

#[test]
fn unknown_fiscal_year_is_fatal() {
    let out = out_dir("bad_fy");
    let output = prepare("tests/data/ais_sample.csv", &out, &["--fy", "2031-32"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid tax rule table"));
    // Fatal errors abort before producing any output.
    assert!(!out.join("Summary.csv").exists());
}

#[test]
fn rules_command_prints_slabs() {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "--", "rules", "--fy", "2023-24"])
        .output()
        .expect("failed to execute command");
    assert!(output.status.success(), "command failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rule table for FY 2023-24"));
    assert!(stdout.contains("250000"));
    assert!(stdout.contains("30%"));
    assert!(stdout.contains("deduction_80c"));
}
