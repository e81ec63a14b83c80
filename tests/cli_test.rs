use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = "VIN (1-10),County,City,State,Postal Code,Model Year,Make,Model,\
Electric Vehicle Type,Electric Range,Legislative District";

/// Write a small registration file with steady growth from 2015 to 2020.
fn create_test_csv(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("ev_registrations.csv");
    let mut content = String::from(HEADER);
    content.push('\n');

    let mut vin = 0;
    for (year, n) in [(2015, 2), (2016, 4), (2017, 7), (2018, 12), (2019, 20), (2020, 33)] {
        for i in 0..n {
            vin += 1;
            let (county, city, make, model, kind, range) = match i % 4 {
                0 => ("King", "Seattle", "TESLA", "MODEL 3", "Battery Electric Vehicle (BEV)", 220),
                1 => ("King", "Bellevue", "NISSAN", "LEAF", "Battery Electric Vehicle (BEV)", 150),
                2 => ("Snohomish", "Bothell", "TESLA", "MODEL Y", "Battery Electric Vehicle (BEV)", 291),
                _ => ("Pierce", "Tacoma", "TOYOTA", "PRIUS PRIME", "Plug-in Hybrid Electric Vehicle (PHEV)", 25),
            };
            content.push_str(&format!(
                "V{vin:09},{county},{city},WA,98101,{year},{make},{model},{kind},{range},43\n"
            ));
        }
    }
    // Incomplete row, dropped on load
    content.push_str("VX00000001,King,,WA,98101,2020,KIA,NIRO,Battery Electric Vehicle (BEV),239,43\n");

    std::fs::write(&path, content).unwrap();
    path
}

fn cmd() -> Command {
    Command::cargo_bin("ev-analyzer").unwrap()
}

// --- Report subcommand ---

#[test]
fn test_report_writes_charts() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);
    let out = dir.path().join("charts");

    cmd()
        .args([
            "report",
            "--input",
            csv_path.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dataset Summary"))
        .stdout(predicate::str::contains("Top Makes"))
        .stdout(predicate::str::contains("Market Size Forecast"))
        .stdout(predicate::str::contains("Wrote 9 charts"));

    for stem in [
        "ev_adoption_by_year",
        "top_cities_top_counties",
        "vehicle_types",
        "top_makes",
        "top_models_top_makes",
        "electric_range_distribution",
        "mean_range_by_year",
        "top_models_by_range",
        "market_forecast",
    ] {
        assert!(out.join(format!("{stem}.svg")).is_file(), "missing {stem}.svg");
    }
}

#[test]
fn test_report_png_format() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);
    let out = dir.path().join("png");

    cmd()
        .args([
            "report",
            "--input",
            csv_path.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--format",
            "png",
        ])
        .assert()
        .success();

    assert!(out.join("market_forecast.png").is_file());
}

#[test]
fn test_report_no_charts() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);
    let out = dir.path().join("unused");

    cmd()
        .args([
            "report",
            "--input",
            csv_path.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
            "--no-charts",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Vehicle Types"))
        .stdout(predicate::str::contains("Wrote").not());

    assert!(!out.exists());
}

#[test]
fn test_report_with_config_file() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);
    let config_path = dir.path().join("ev.toml");
    let out = dir.path().join("configured");
    std::fs::write(
        &config_path,
        format!(
            "[top]\nmakes = 2\n\n[charts]\noutput_dir = \"{}\"\nwidth = 800\nheight = 600\n",
            out.display()
        ),
    )
    .unwrap();

    cmd()
        .args([
            "report",
            "--input",
            csv_path.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(out.join("top_makes.svg").is_file());
}

#[test]
fn test_report_invalid_config() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);
    let config_path = dir.path().join("bad.toml");
    std::fs::write(&config_path, "[forecast]\nhorizon = 0\n").unwrap();

    cmd()
        .args([
            "report",
            "--input",
            csv_path.to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "--no-charts",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("horizon"));
}

#[test]
fn test_report_single_model_year_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("one_year.csv");
    std::fs::write(
        &path,
        format!(
            "{HEADER}\n\
             V000000001,King,Seattle,WA,98101,2020,TESLA,MODEL 3,Battery Electric Vehicle (BEV),322,43\n\
             V000000002,King,Bellevue,WA,98004,2020,NISSAN,LEAF,Battery Electric Vehicle (BEV),149,41\n"
        ),
    )
    .unwrap();
    let out = dir.path().join("charts");

    cmd()
        .args([
            "report",
            "--input",
            path.to_str().unwrap(),
            "--output-dir",
            out.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Fit error"))
        .stdout(predicate::str::contains("Wrote").not());

    assert!(!out.join("market_forecast.svg").exists());
}

// --- Forecast subcommand ---

#[test]
fn test_forecast_table() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    cmd()
        .args(["forecast", "--input", csv_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("b (growth rate)"))
        .stdout(predicate::str::contains("2026"));
}

#[test]
fn test_forecast_json() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    let output = cmd()
        .args([
            "forecast",
            "--input",
            csv_path.to_str().unwrap(),
            "--horizon",
            "3",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["base_year"], 2015);
    let projected = value["projected"].as_array().unwrap();
    let years: Vec<i64> = projected.iter().map(|p| p["year"].as_i64().unwrap()).collect();
    assert_eq!(years, vec![2021, 2022, 2023]);
    assert!(value["fit"]["params"]["b"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_forecast_cutoff_excludes_later_years() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    let output = cmd()
        .args([
            "forecast",
            "--input",
            csv_path.to_str().unwrap(),
            "--cutoff",
            "2018",
            "--json",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["historical"].as_array().unwrap().len(), 4);
    assert_eq!(value["projected"][0]["year"], 2019);
}

#[test]
fn test_forecast_single_year_fails() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    cmd()
        .args([
            "forecast",
            "--input",
            csv_path.to_str().unwrap(),
            "--cutoff",
            "2015",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Fit error"));
}

#[test]
fn test_forecast_horizon_too_large() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    cmd()
        .args([
            "forecast",
            "--input",
            csv_path.to_str().unwrap(),
            "--horizon",
            "3000000000",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("forecast.horizon"));
}

// --- Summary subcommand ---

#[test]
fn test_summary() {
    let dir = TempDir::new().unwrap();
    let csv_path = create_test_csv(&dir);

    cmd()
        .args(["summary", "--input", csv_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Quick Summary"))
        .stdout(predicate::str::contains("Rows Read:      79"))
        .stdout(predicate::str::contains("Rows Dropped:   1"))
        .stdout(predicate::str::contains("2015-2020"));
}

// --- Error handling ---

#[test]
fn test_missing_input_file() {
    cmd()
        .args(["summary", "--input", "nonexistent.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.xlsx");
    std::fs::write(&path, "not a spreadsheet").unwrap();

    cmd()
        .args(["summary", "--input", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn test_missing_column() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "County,City,Make\nKing,Seattle,TESLA\n").unwrap();

    cmd()
        .args(["summary", "--input", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required column"));
}

#[test]
fn test_no_subcommand() {
    cmd().assert().failure();
}

#[test]
fn test_help() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("EV Market Analyzer"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("forecast"));
}

#[test]
fn test_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ev-analyzer"));
}
