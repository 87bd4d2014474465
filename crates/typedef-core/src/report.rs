use schemars::schema::RootSchema;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, ValidatorConfig};

/// Serializable outcome of validating one instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    /// True when no errors were found.
    pub valid: bool,
    /// True when collection stopped at the configured error limit; further
    /// errors may exist. Also set when the instance has exactly that many.
    pub truncated: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    /// Build a report from the errors a validator with `config` returned.
    pub fn new(errors: Vec<ValidationError>, config: ValidatorConfig) -> Self {
        Self {
            valid: errors.is_empty(),
            truncated: config.max_errors > 0 && errors.len() >= config.max_errors,
            errors,
        }
    }

    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.valid
    }
}

/// Emit the JSON Schema for validation reports.
pub fn report_json_schema() -> RootSchema {
    schema_for!(ValidationReport)
}
