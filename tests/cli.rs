mod common;

use assert_cmd::Command;
use common::{TestWorkspace, fixture_path};
use predicates::{prelude::*, str::contains};

fn bin() -> Command {
    Command::cargo_bin("dataset-fixture").expect("binary exists")
}

fn compare_orders() -> Command {
    let mut cmd = bin();
    cmd.arg("compare")
        .arg("--expected")
        .arg(fixture_path("orders_expected"))
        .arg("--actual")
        .arg(fixture_path("orders_actual"));
    cmd
}

#[test]
fn compare_succeeds_with_exclusion_and_tolerance() {
    compare_orders()
        .args(["--exclude", "UPDATED_AT", "--tolerance", "ORDERS.AMOUNT=0.01"])
        .assert()
        .success()
        .stdout(contains("No differences found in 2 table(s)"));
}

#[test]
fn compare_fails_fast_on_first_difference() {
    compare_orders()
        .assert()
        .failure()
        .stderr(contains(
            "value (table=ORDERS, row=0, col=AMOUNT) expected:<12.50> but was:<12.501>",
        ))
        .stdout(contains("difference(s)").not());
}

#[test]
fn compare_reports_additional_row_info_for_excluded_columns() {
    compare_orders()
        .args(["--exclude", "ID", "--additional-column", "ID"])
        .assert()
        .failure()
        .stderr(contains(
            "col=AMOUNT, Additional row info: ('ID': expected=<10>, actual=<10>)) expected:<12.50> but was:<12.501>",
        ));
}

#[test]
fn collect_mode_emits_every_difference_as_json() {
    let output = compare_orders()
        .args(["--collect", "--format", "json"])
        .assert()
        .failure()
        .stderr(contains("Datasets differ: 5 difference(s) and 0 table error(s)"))
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).expect("json report");
    assert_eq!(report["tables_compared"], 2);
    let differences = report["differences"].as_array().expect("differences array");
    let cells = differences
        .iter()
        .map(|d| {
            (
                d["row"].as_u64().unwrap(),
                d["column"].as_str().unwrap().to_string(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        cells,
        vec![
            (0, "AMOUNT".to_string()),
            (0, "UPDATED_AT".to_string()),
            (1, "UPDATED_AT".to_string()),
            (2, "AMOUNT".to_string()),
            (2, "UPDATED_AT".to_string()),
        ]
    );
}

#[test]
fn collect_mode_renders_a_table_report() {
    compare_orders()
        .args(["--collect", "--exclude", "UPDATED_AT"])
        .assert()
        .failure()
        .stdout(contains("TABLE"))
        .stdout(contains("12.501"))
        .stdout(contains("2 difference(s) and 0 table error(s) in 2 table(s)"));
}

#[test]
fn compare_uses_config_file() {
    let workspace = TestWorkspace::new();
    let config = workspace.write(
        "compare.yml",
        "mode: collect\n\
         tables:\n  ORDERS:\n    exclude: [UPDATED_AT]\n    additional_columns: [ID]\n\
         tolerances:\n  - { table: orders, column: amount, delta: 0.01 }\n",
    );
    compare_orders()
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(contains("No differences found in 2 table(s)"));
}

#[test]
fn compare_rejects_invalid_config() {
    let workspace = TestWorkspace::new();
    let config = workspace.write(
        "compare.yml",
        "tolerances:\n  - { table: ORDERS, column: AMOUNT, delta: -1 }\n",
    );
    compare_orders()
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("error: Loading comparison config"));
}

#[test]
fn compare_prints_unified_diff() {
    compare_orders()
        .args(["--exclude", "UPDATED_AT", "--diff"])
        .assert()
        .failure()
        .stdout(contains("--- expected/ORDERS"))
        .stdout(contains("-AMOUNT=12.50, CUSTOMER_ID=1, ID=10"))
        .stdout(contains("+AMOUNT=12.501, CUSTOMER_ID=1, ID=10"));
}

#[test]
fn compare_limits_to_selected_tables() {
    compare_orders()
        .args(["--table", "customers"])
        .assert()
        .success()
        .stdout(contains("No differences found in 1 table(s)"));
}

#[test]
fn compare_rejects_malformed_tolerance() {
    compare_orders()
        .args(["--tolerance", "AMOUNT=0.01"])
        .assert()
        .failure()
        .stderr(contains("TABLE.COLUMN"));
}

#[test]
fn parse_writes_standard_csv() {
    bin()
        .args(["parse", "-i"])
        .arg(fixture_path("orders_expected/ORDERS.csv"))
        .assert()
        .success()
        .stdout(contains("\"first \"\"rush\"\" order\""))
        .stdout(contains("\"multi\nline\""));
}

#[test]
fn parse_renders_aligned_table() {
    bin()
        .args(["parse", "--table", "-i"])
        .arg(fixture_path("orders_expected/CUSTOMERS.csv"))
        .assert()
        .success()
        .stdout(contains("ID"))
        .stdout(contains("Ann, Jr."));
}

#[test]
fn parse_reads_stdin() {
    bin()
        .args(["parse", "-i", "-"])
        .write_stdin("A , B\n\"x\\\"y\",2\n")
        .assert()
        .success()
        .stdout("A,B\n\"x\"\"y\",2\n");
}

#[test]
fn parse_rejects_illegal_input() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("bad.csv", "A,B\nab\"c,d\n");
    bin()
        .args(["parse", "-i"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(contains("error: Tokenizing"));
}

#[test]
fn export_to_yaml_and_csv_round_trips() {
    let workspace = TestWorkspace::new();
    let yaml = workspace.path().join("orders.yaml");
    bin()
        .args(["export", "-i"])
        .arg(fixture_path("orders_expected"))
        .arg("-o")
        .arg(&yaml)
        .assert()
        .success();
    assert!(yaml.exists());

    let csv_dir = workspace.path().join("from_yaml");
    bin()
        .args(["export", "-i"])
        .arg(&yaml)
        .arg("-o")
        .arg(&csv_dir)
        .assert()
        .success();

    bin()
        .arg("compare")
        .arg("--expected")
        .arg(fixture_path("orders_expected"))
        .arg("--actual")
        .arg(&csv_dir)
        .assert()
        .success()
        .stdout(contains("No differences found in 2 table(s)"));
}
