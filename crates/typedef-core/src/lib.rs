//! Schema language for JSON-like data and a validator for it.
//!
//! A [`Schema`] is built from an already-parsed [`serde_json::Value`], checked
//! once with [`check_schema`], and then reused for any number of
//! [`Validator::validate`] calls. Validation reports each violation as a
//! [`ValidationError`] holding a path into the instance and a path into the
//! schema.

pub mod check;
mod decode;
pub mod error;
pub mod report;
pub mod schema;
pub mod types;
pub mod validate;

pub use check::{SchemaIssue, check_schema, collect_schema_issues};
pub use error::{Error, Result};
pub use report::{ValidationReport, report_json_schema};
pub use schema::{Form, Schema};
pub use types::Type;
pub use validate::{ValidationError, Validator, ValidatorConfig, validate};
