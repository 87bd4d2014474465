use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;
use typedef_core::{Schema, ValidationError, Validator};

#[derive(Debug, Deserialize)]
struct Suite {
    name: String,
    schema: Value,
    instances: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Case {
    instance: Value,
    errors: Vec<ExpectedError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpectedError {
    instance_path: String,
    schema_path: String,
}

#[derive(Debug, Deserialize)]
struct InvalidSchema {
    name: String,
    schema: Value,
}

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn load<T: for<'de> Deserialize<'de>>(name: &str) -> T {
    let path = fixture_path(name);
    let contents =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing fixture {}", path.display()));
    serde_json::from_str(&contents).expect("parse fixture")
}

fn tokens(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[test]
fn validation_suites_match_expected_errors() {
    let suites: Vec<Suite> = load("validation.json");
    let validator = Validator::default();

    for suite in suites {
        let schema = Schema::from_json(&suite.schema)
            .unwrap_or_else(|err| panic!("{}: construct schema: {err}", suite.name));
        schema
            .check()
            .unwrap_or_else(|err| panic!("{}: check schema: {err}", suite.name));

        for (idx, case) in suite.instances.iter().enumerate() {
            let mut expected: Vec<ValidationError> = case
                .errors
                .iter()
                .map(|error| {
                    ValidationError::new(tokens(&error.instance_path), tokens(&error.schema_path))
                })
                .collect();
            let mut actual = validator
                .validate(&schema, &case.instance)
                .unwrap_or_else(|err| panic!("{}/{idx}: validate: {err}", suite.name));

            expected.sort();
            actual.sort();
            assert_eq!(actual, expected, "{}/{idx}", suite.name);
        }
    }
}

#[test]
fn invalid_schemas_are_rejected() {
    let cases: Vec<InvalidSchema> = load("invalid_schemas.json");

    for case in cases {
        let outcome = Schema::from_json(&case.schema).and_then(|schema| schema.check());
        assert!(outcome.is_err(), "{} should be rejected", case.name);
    }
}
