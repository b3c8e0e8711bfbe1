mod common;

use assert_cmd::Command;
use common::{TestWorkspace, latin1};
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn table2sql() -> Command {
    let mut cmd = Command::cargo_bin("table2sql").expect("binary exists");
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn convert_reports_each_file_and_succeeds() {
    let workspace = TestWorkspace::new();
    let first = workspace.write("clienti.csv", "id;nome\n1;Anna\n2;Bruno\n");
    let second = workspace.write("ordini.csv", "id,totale\n10,99.90\n");

    table2sql()
        .args([
            "convert",
            "-i",
            first.to_str().unwrap(),
            "-i",
            second.to_str().unwrap(),
            "-d",
            "postgres",
            "-s",
            "public",
            "-t",
            "staging",
        ])
        .assert()
        .success()
        .stdout(
            contains("clienti.csv -> OK (")
                .and(contains("rows: 2)"))
                .and(contains("ordini.csv -> OK ("))
                .and(contains("rows: 1)")),
        );

    let sql = workspace.read("clienti.sql");
    assert!(sql.contains("INSERT INTO [public].[staging] (\"id\", \"nome\") VALUES ('2', 'Bruno');"));
    assert!(workspace.path().join("ordini.sql").exists());
}

#[test]
fn convert_exits_non_zero_when_any_file_fails() {
    let workspace = TestWorkspace::new();
    let good = workspace.write("good.csv", "a,b\n1,2\n");
    let missing = workspace.path().join("missing.csv");

    table2sql()
        .args([
            "convert",
            "-i",
            missing.to_str().unwrap(),
            "-i",
            good.to_str().unwrap(),
            "-d",
            "oracle",
            "-s",
            "HR",
            "-t",
            "T",
        ])
        .assert()
        .failure()
        .stdout(contains("missing.csv -> Error: ").and(contains("good.csv -> OK (")))
        .stderr(contains("1 of 2 file(s) failed"));
    assert!(workspace.path().join("good.sql").exists());
}

#[test]
fn convert_rejects_unknown_dialect() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("t.csv", "a,b\n1,2\n");
    table2sql()
        .args([
            "convert", "-i", input.to_str().unwrap(), "-d", "mysql", "-s", "s", "-t", "t",
        ])
        .assert()
        .failure()
        .stderr(contains("mysql"));
}

#[test]
fn convert_accepts_dialect_aliases() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("t.csv", "a,b\n1,2\n");
    table2sql()
        .args([
            "convert", "-i", input.to_str().unwrap(), "-d", "mssql", "-s", "dbo", "-t", "t",
            "--database", "Staging",
        ])
        .assert()
        .success();
    assert!(workspace.read("t.sql").starts_with("USE [Staging]\nGO\n\n"));
}

#[test]
fn convert_with_streaming_flags_and_log_file() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("orders.csv", &common::sample_csv(30));
    let out_dir = workspace.path().join("sql");
    std::fs::create_dir(&out_dir).unwrap();

    table2sql()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-d",
            "sqlserver",
            "-s",
            "dbo",
            "-t",
            "orders",
            "--database",
            "Sales",
            "-o",
            out_dir.to_str().unwrap(),
            "--stream-threshold",
            "0",
            "--chunk-rows",
            "8",
            "--log-file",
        ])
        .assert()
        .success()
        .stdout(contains("orders.csv -> OK (").and(contains("rows: 30)")));

    let sql = std::fs::read_to_string(out_dir.join("orders.sql")).unwrap();
    assert!(sql.starts_with("USE [Sales]\nGO\n\nDELETE FROM [dbo].[orders];"));
    assert_eq!(sql.matches("INSERT INTO").count(), 30);

    let log = workspace.read("orders_log.log");
    assert!(log.contains(" - INFO - "));
    assert!(log.contains("Conversion completed: 30 INSERT statement(s)"));
}

#[test]
fn convert_applies_yaml_config() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("t.csv", "a,b\n1,-\n2,x\n");
    let config = workspace.write("settings.yml", "null_markers:\n  - \"-\"\n");

    table2sql()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-d",
            "oracle",
            "-s",
            "s",
            "-t",
            "t",
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(workspace.read("t.sql").contains("VALUES ('1', NULL);"));
}

#[test]
fn convert_rejects_unknown_config_keys() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("t.csv", "a,b\n1,2\n");
    let config = workspace.write("settings.yml", "chunk_size: 10\n");

    table2sql()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-d",
            "oracle",
            "-s",
            "s",
            "-t",
            "t",
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("Loading converter settings"));
    assert!(!workspace.path().join("t.sql").exists());
}

#[test]
fn detect_prints_dialect_and_preview() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_bytes(
        "anagrafica.csv",
        &latin1("nome;città\nMàrio;Ròma\nLùcia;Milàno\n"),
    );

    table2sql()
        .args(["detect", "-i", input.to_str().unwrap(), "--rows", "1"])
        .assert()
        .success()
        .stdout(
            contains("Separator ';', encoding latin-1")
                .and(contains("città"))
                .and(contains("Màrio"))
                .and(contains("Lùcia").not()),
        );
}

#[test]
fn detect_json_lists_attempts() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("plain.csv", "a,b\n1,2\n3,4\n");

    let output = table2sql()
        .args(["detect", "-i", input.to_str().unwrap(), "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("json report");
    assert_eq!(report["separator"], ",");
    assert_eq!(report["encoding"], "utf-8");
    assert_eq!(report["columns"], serde_json::json!(["a", "b"]));
    assert_eq!(report["rows_probed"], 2);
    assert_eq!(report["attempts"].as_array().map(Vec::len), Some(20));
}

#[test]
fn detect_fails_on_unparseable_input() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("empty.csv", "");
    table2sql()
        .args(["detect", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("CSVLoadError"));
}

#[test]
fn convert_rejects_zero_chunk_rows() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("t.csv", "a,b\n1,2\n3,4\n");
    table2sql()
        .args([
            "convert", "-i", input.to_str().unwrap(), "-d", "oracle", "-s", "s", "-t", "t",
            "--stream-threshold", "0", "--chunk-rows", "0",
        ])
        .assert()
        .failure()
        .stderr(contains("chunk_rows must be greater than zero"));
    assert!(!workspace.path().join("t.sql").exists());
}
