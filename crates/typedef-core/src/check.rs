use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{Error, Result};
use crate::schema::{Form, Schema};

/// One violated well-formedness rule, located within the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    pub code: &'static str,
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    fn new(code: &'static str, path: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            path: if path.is_empty() {
                "/".to_string()
            } else {
                path.to_string()
            },
            message: message.into(),
        }
    }
}

/// Validate internal consistency of a schema, treating it as the root.
///
/// This checks:
/// - only the root carries `definitions`
/// - every `ref` names a root definition
/// - enums are non-empty
/// - `properties` and `optionalProperties` do not share keys
/// - discriminator branches are `properties` schemas that leave the tag alone
pub fn check_schema(schema: &Schema) -> Result<()> {
    let issues = collect_schema_issues(schema);
    if issues.is_empty() {
        return Ok(());
    }

    let reasons = issues
        .iter()
        .map(|issue| format!("{} at {}", issue.message, issue.path))
        .collect::<Vec<_>>()
        .join("; ");
    Err(Error::InvalidSchema(reasons))
}

/// Collect every well-formedness issue in a schema, treating it as the root.
pub fn collect_schema_issues(schema: &Schema) -> Vec<SchemaIssue> {
    let mut checker = Checker {
        root: schema,
        issues: Vec::new(),
    };

    checker.visit_form(schema, "");
    if let Some(definitions) = &schema.definitions {
        for (name, definition) in definitions {
            checker.visit(definition, &format!("/definitions/{name}"));
        }
    }

    debug!(
        event = "schema_checked",
        issues = checker.issues.len(),
        definitions = schema.definitions.as_ref().map_or(0, BTreeMap::len)
    );
    checker.issues
}

struct Checker<'a> {
    root: &'a Schema,
    issues: Vec<SchemaIssue>,
}

impl Checker<'_> {
    /// Check a schema that is not the root.
    fn visit(&mut self, schema: &Schema, path: &str) {
        if schema.definitions.is_some() {
            self.issues.push(SchemaIssue::new(
                "non_root_definitions",
                path,
                "definitions are only allowed on the root schema",
            ));
        }
        self.visit_form(schema, path);
    }

    fn visit_form(&mut self, schema: &Schema, path: &str) {
        match &schema.form {
            Form::Empty | Form::Type(_) => {}
            Form::Ref(name) => {
                let resolved = self
                    .root
                    .definitions
                    .as_ref()
                    .is_some_and(|definitions| definitions.contains_key(name));
                if !resolved {
                    self.issues.push(SchemaIssue::new(
                        "unknown_ref",
                        path,
                        format!("ref '{name}' does not name a root definition"),
                    ));
                }
            }
            Form::Enum(values) => {
                if values.is_empty() {
                    self.issues.push(SchemaIssue::new(
                        "empty_enum",
                        path,
                        "enum must contain at least one value",
                    ));
                }
            }
            Form::Elements(sub) => self.visit(sub, &format!("{path}/elements")),
            Form::Values(sub) => self.visit(sub, &format!("{path}/values")),
            Form::Properties {
                required, optional, ..
            } => {
                if let (Some(required), Some(optional)) = (required, optional) {
                    for key in required.keys().filter(|key| optional.contains_key(*key)) {
                        self.issues.push(SchemaIssue::new(
                            "overlapping_properties",
                            path,
                            format!("'{key}' is both a required and an optional property"),
                        ));
                    }
                }
                for (key, sub) in required.iter().flatten() {
                    self.visit(sub, &format!("{path}/properties/{key}"));
                }
                for (key, sub) in optional.iter().flatten() {
                    self.visit(sub, &format!("{path}/optionalProperties/{key}"));
                }
            }
            Form::Discriminator { tag, mapping } => {
                for (name, branch) in mapping {
                    let branch_path = format!("{path}/discriminator/mapping/{name}");
                    self.visit(branch, &branch_path);
                    self.check_branch(tag, branch, &branch_path);
                }
            }
        }
    }

    fn check_branch(&mut self, tag: &str, branch: &Schema, path: &str) {
        let Form::Properties {
            required, optional, ..
        } = &branch.form
        else {
            self.issues.push(SchemaIssue::new(
                "mapping_not_properties",
                path,
                format!(
                    "discriminator mapping values must be properties schemas, found {}",
                    branch.form.keyword().unwrap_or("empty")
                ),
            ));
            return;
        };

        let redeclared = required
            .iter()
            .chain(optional.iter())
            .any(|members| members.contains_key(tag));
        if redeclared {
            self.issues.push(SchemaIssue::new(
                "tag_redeclared",
                path,
                format!("discriminator tag '{tag}' must not be declared as a property"),
            ));
        }
    }
}
