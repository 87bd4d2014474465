use std::path::Path;
use std::process::{Command, Output};

use serde_json::{Value, json};

fn write_json(dir: &Path, name: &str, value: &Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec(value).expect("encode json")).expect("write json");
    path.display().to_string()
}

fn typedef(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_typedef"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run typedef")
}

fn report_lines(output: &Output) -> Vec<Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("report line"))
        .collect()
}

#[test]
fn validate_reports_each_instance() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_json(
        dir.path(),
        "schema.json",
        &json!({ "properties": { "a": {} }, "additionalProperties": false }),
    );
    let good = write_json(dir.path(), "good.json", &json!({ "a": 1 }));
    let bad = write_json(dir.path(), "bad.json", &json!({ "a": 1, "b": 2 }));

    let output = typedef(dir.path(), &["validate", "--schema", &schema, &good, &bad]);
    assert_eq!(output.status.code(), Some(1));

    let lines = report_lines(&output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["valid"], json!(true));
    assert_eq!(lines[1]["valid"], json!(false));
    assert_eq!(
        lines[1]["errors"],
        json!([{ "instancePath": ["b"], "schemaPath": [] }])
    );
}

#[test]
fn max_errors_from_config_file_truncates() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("typedef.toml"),
        "[validator]\nmax_errors = 3\n",
    )
    .expect("write config");
    let schema = write_json(
        dir.path(),
        "schema.json",
        &json!({ "elements": { "type": "string" } }),
    );
    let instance = write_json(dir.path(), "list.json", &json!([1, 1, 1, 1, 1]));

    let output = typedef(dir.path(), &["validate", "--schema", &schema, &instance]);
    assert_eq!(output.status.code(), Some(1));
    let lines = report_lines(&output);
    assert_eq!(lines[0]["truncated"], json!(true));
    assert_eq!(lines[0]["errors"].as_array().map(Vec::len), Some(3));
}

#[test]
fn depth_limit_is_a_command_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_json(
        dir.path(),
        "schema.json",
        &json!({ "definitions": { "loop": { "ref": "loop" } }, "ref": "loop" }),
    );
    let instance = write_json(dir.path(), "one.json", &json!(1));

    let output = typedef(
        dir.path(),
        &["validate", "--schema", &schema, "--max-depth", "3", &instance],
    );
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("max depth exceeded"));
}

#[test]
fn check_rejects_ill_formed_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_json(dir.path(), "schema.json", &json!({ "ref": "missing" }));

    let output = typedef(dir.path(), &["check", &schema]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid schema"));
}

#[test]
fn check_prints_normalized_schema() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_json(
        dir.path(),
        "schema.json",
        &json!({ "values": { "type": "uint8" }, "description": "ignored" }),
    );

    let output = typedef(dir.path(), &["check", "--print", &schema]);
    assert!(output.status.success());
    let printed: Value = serde_json::from_slice(&output.stdout).expect("schema json");
    assert_eq!(printed, json!({ "values": { "type": "uint8" } }));
}
