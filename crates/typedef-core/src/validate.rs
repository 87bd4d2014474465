use std::collections::BTreeMap;
use std::fmt;
use std::ops::ControlFlow;

use chrono::DateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::schema::{Form, Schema};
use crate::types::Type;

/// Circuit-breaker limits for a validator. Zero disables a limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Maximum number of nested `ref` indirections. With `max_depth = N`,
    /// N refs may be active at once and the next one fails; the root schema
    /// does not count toward the limit.
    pub max_depth: usize,
    /// Stop after collecting this many errors.
    pub max_errors: usize,
}

/// One constraint violation, located in both the instance and the schema.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub instance_path: Vec<String>,
    pub schema_path: Vec<String>,
}

impl ValidationError {
    pub fn new<I, S>(instance_path: I, schema_path: S) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Self {
            instance_path: instance_path.into_iter().map(Into::into).collect(),
            schema_path: schema_path.into_iter().map(Into::into).collect(),
        }
    }

    /// Instance path joined with `/`, empty for the instance root.
    pub fn instance_pointer(&self) -> String {
        self.instance_path.join("/")
    }

    /// Schema path joined with `/`, empty for the schema root.
    pub fn schema_pointer(&self) -> String {
        self.schema_path.join("/")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "instance at '/{}' rejected by schema at '/{}'",
            self.instance_pointer(),
            self.schema_pointer()
        )
    }
}

/// Validates instances against checked schemas.
///
/// The schema must have passed [`check_schema`](crate::check_schema). A `ref`
/// to a missing definition is reported as [`Error::UnresolvedRef`] instead of
/// a validation error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Limits this validator was built with.
    pub fn config(&self) -> ValidatorConfig {
        self.config
    }

    /// Validate `instance` against `schema`, which is used as the root for
    /// `ref` resolution.
    ///
    /// Returns every violation found, or the first `max_errors` of them.
    /// Fails only when `ref` nesting exceeds `max_depth` or a `ref` cannot
    /// be resolved.
    pub fn validate(&self, schema: &Schema, instance: &Value) -> Result<Vec<ValidationError>> {
        let mut vm = Vm {
            config: self.config,
            root: schema,
            instance_path: Vec::new(),
            schema_path: Vec::new(),
            depth: 0,
            errors: Vec::new(),
        };

        match vm.eval(schema, instance, None) {
            ControlFlow::Continue(()) => {}
            ControlFlow::Break(Halt::ErrorLimit) => {
                debug!(
                    event = "error_limit_reached",
                    max_errors = self.config.max_errors
                );
            }
            ControlFlow::Break(Halt::DepthExceeded) => {
                debug!(
                    event = "depth_limit_exceeded",
                    max_depth = self.config.max_depth
                );
                return Err(Error::MaxDepthExceeded {
                    max_depth: self.config.max_depth,
                });
            }
            ControlFlow::Break(Halt::UnresolvedRef(name)) => {
                return Err(Error::UnresolvedRef(name));
            }
        }

        debug!(event = "validation_finished", errors = vm.errors.len());
        Ok(vm.errors)
    }
}

/// Validate with no depth or error limits.
pub fn validate(schema: &Schema, instance: &Value) -> Result<Vec<ValidationError>> {
    Validator::default().validate(schema, instance)
}

/// Why evaluation stopped before visiting the whole instance.
#[derive(Debug)]
enum Halt {
    ErrorLimit,
    DepthExceeded,
    UnresolvedRef(String),
}

type Step = ControlFlow<Halt>;

const CONTINUE: Step = ControlFlow::Continue(());

struct Vm<'a> {
    config: ValidatorConfig,
    root: &'a Schema,
    instance_path: Vec<String>,
    /// Path within the schema frame currently being evaluated. A `ref`
    /// starts a new frame at `definitions/<name>`.
    schema_path: Vec<String>,
    depth: usize,
    errors: Vec<ValidationError>,
}

impl<'a> Vm<'a> {
    fn eval(&mut self, schema: &'a Schema, instance: &Value, parent_tag: Option<&str>) -> Step {
        match &schema.form {
            Form::Empty => CONTINUE,
            Form::Ref(name) => self.eval_ref(name, instance),
            Form::Type(ty) => self.with_schema_token("type", |vm| {
                if conforms(*ty, instance) {
                    CONTINUE
                } else {
                    vm.push_error()
                }
            }),
            Form::Enum(values) => self.with_schema_token("enum", |vm| {
                match instance.as_str() {
                    Some(value) if values.contains(value) => CONTINUE,
                    _ => vm.push_error(),
                }
            }),
            Form::Elements(sub) => self.with_schema_token("elements", |vm| {
                let Value::Array(items) = instance else {
                    return vm.push_error();
                };
                for (idx, item) in items.iter().enumerate() {
                    vm.with_instance_token(&idx.to_string(), |vm| vm.eval(sub, item, None))?;
                }
                CONTINUE
            }),
            Form::Properties {
                required,
                optional,
                additional,
            } => self.eval_properties(
                required.as_ref(),
                optional.as_ref(),
                *additional,
                instance,
                parent_tag,
            ),
            Form::Values(sub) => self.with_schema_token("values", |vm| {
                let Value::Object(members) = instance else {
                    return vm.push_error();
                };
                for (key, value) in members {
                    vm.with_instance_token(key, |vm| vm.eval(sub, value, None))?;
                }
                CONTINUE
            }),
            Form::Discriminator { tag, mapping } => self.eval_discriminator(tag, mapping, instance),
        }
    }

    fn eval_ref(&mut self, name: &str, instance: &Value) -> Step {
        if self.config.max_depth > 0 && self.depth >= self.config.max_depth {
            return ControlFlow::Break(Halt::DepthExceeded);
        }

        let Some(target) = self
            .root
            .definitions
            .as_ref()
            .and_then(|definitions| definitions.get(name))
        else {
            return ControlFlow::Break(Halt::UnresolvedRef(name.to_string()));
        };

        let frame = vec!["definitions".to_string(), name.to_string()];
        let saved = std::mem::replace(&mut self.schema_path, frame);
        self.depth += 1;
        trace!(event = "ref_entered", name, depth = self.depth);

        let step = self.eval(target, instance, None);

        self.depth -= 1;
        self.schema_path = saved;
        step
    }

    fn eval_properties(
        &mut self,
        required: Option<&'a BTreeMap<String, Schema>>,
        optional: Option<&'a BTreeMap<String, Schema>>,
        additional: bool,
        instance: &Value,
        parent_tag: Option<&str>,
    ) -> Step {
        let Value::Object(members) = instance else {
            let keyword = if required.is_some() {
                "properties"
            } else {
                "optionalProperties"
            };
            return self.with_schema_token(keyword, |vm| vm.push_error());
        };

        if let Some(required) = required {
            self.with_schema_token("properties", |vm| {
                for (key, sub) in required {
                    vm.with_schema_token(key, |vm| match members.get(key) {
                        Some(value) => vm.with_instance_token(key, |vm| vm.eval(sub, value, None)),
                        None => vm.push_error(),
                    })?;
                }
                CONTINUE
            })?;
        }

        if let Some(optional) = optional {
            self.with_schema_token("optionalProperties", |vm| {
                for (key, sub) in optional {
                    let Some(value) = members.get(key) else {
                        continue;
                    };
                    vm.with_schema_token(key, |vm| {
                        vm.with_instance_token(key, |vm| vm.eval(sub, value, None))
                    })?;
                }
                CONTINUE
            })?;
        }

        if !additional {
            for key in members.keys() {
                if !is_declared(key, required, optional, parent_tag) {
                    self.with_instance_token(key, |vm| vm.push_error())?;
                }
            }
        }

        CONTINUE
    }

    fn eval_discriminator(
        &mut self,
        tag: &'a str,
        mapping: &'a BTreeMap<String, Schema>,
        instance: &Value,
    ) -> Step {
        self.with_schema_token("discriminator", |vm| {
            let Value::Object(members) = instance else {
                return vm.push_error();
            };

            match members.get(tag) {
                None => vm.with_schema_token("tag", |vm| vm.push_error()),
                Some(Value::String(value)) => match mapping.get(value) {
                    Some(branch) => vm.with_schema_token("mapping", |vm| {
                        vm.with_schema_token(value, |vm| vm.eval(branch, instance, Some(tag)))
                    }),
                    None => vm.with_schema_token("mapping", |vm| {
                        vm.with_instance_token(tag, |vm| vm.push_error())
                    }),
                },
                Some(_) => vm.with_schema_token("tag", |vm| {
                    vm.with_instance_token(tag, |vm| vm.push_error())
                }),
            }
        })
    }

    /// Run `f` with `token` appended to the schema path, restoring the path
    /// on every exit.
    fn with_schema_token<F>(&mut self, token: &str, f: F) -> Step
    where
        F: FnOnce(&mut Self) -> Step,
    {
        self.schema_path.push(token.to_string());
        let step = f(self);
        self.schema_path.pop();
        step
    }

    /// Run `f` with `token` appended to the instance path, restoring the
    /// path on every exit.
    fn with_instance_token<F>(&mut self, token: &str, f: F) -> Step
    where
        F: FnOnce(&mut Self) -> Step,
    {
        self.instance_path.push(token.to_string());
        let step = f(self);
        self.instance_path.pop();
        step
    }

    fn push_error(&mut self) -> Step {
        let error = ValidationError {
            instance_path: self.instance_path.clone(),
            schema_path: self.schema_path.clone(),
        };
        trace!(event = "validation_error", error = %error);
        self.errors.push(error);

        if self.config.max_errors > 0 && self.errors.len() >= self.config.max_errors {
            ControlFlow::Break(Halt::ErrorLimit)
        } else {
            CONTINUE
        }
    }
}

fn is_declared(
    key: &str,
    required: Option<&BTreeMap<String, Schema>>,
    optional: Option<&BTreeMap<String, Schema>>,
    parent_tag: Option<&str>,
) -> bool {
    required.is_some_and(|members| members.contains_key(key))
        || optional.is_some_and(|members| members.contains_key(key))
        || parent_tag == Some(key)
}

fn conforms(ty: Type, instance: &Value) -> bool {
    match ty {
        Type::Boolean => instance.is_boolean(),
        Type::Float32 | Type::Float64 => instance.is_number(),
        Type::Int8 | Type::Uint8 | Type::Int16 | Type::Uint16 | Type::Int32 | Type::Uint32 => {
            is_integer_in_range(ty, instance)
        }
        Type::String => instance.is_string(),
        Type::Timestamp => instance.as_str().is_some_and(is_timestamp),
    }
}

fn is_integer_in_range(ty: Type, instance: &Value) -> bool {
    let (Some((min, max)), Some(number)) = (ty.integer_range(), instance.as_f64()) else {
        return false;
    };
    number.fract() == 0.0 && (min..=max).contains(&number)
}

fn is_timestamp(value: &str) -> bool {
    // chrono also accepts a space between date and time; RFC 3339 does not.
    value
        .as_bytes()
        .get(10)
        .is_some_and(|sep| matches!(sep, b'T' | b't'))
        && DateTime::parse_from_rfc3339(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_check_rejects_fractions_and_out_of_range() {
        assert!(is_integer_in_range(Type::Uint8, &json!(255)));
        assert!(is_integer_in_range(Type::Uint8, &json!(255.0)));
        assert!(!is_integer_in_range(Type::Uint8, &json!(256)));
        assert!(!is_integer_in_range(Type::Uint8, &json!(-1)));
        assert!(!is_integer_in_range(Type::Int8, &json!(1.5)));
        assert!(is_integer_in_range(Type::Int8, &json!(-128)));
        assert!(!is_integer_in_range(Type::Int32, &json!("1")));
        assert!(is_integer_in_range(Type::Uint32, &json!(4_294_967_295_u64)));
        assert!(!is_integer_in_range(Type::Uint32, &json!(4_294_967_296_u64)));
    }

    #[test]
    fn timestamps_follow_rfc3339() {
        assert!(is_timestamp("1985-04-12T23:20:50.52Z"));
        assert!(is_timestamp("1996-12-19T16:39:57-08:00"));
        assert!(is_timestamp("1985-04-12T23:20:50Z"));
        assert!(is_timestamp("1985-04-12t23:20:50z"));
        assert!(!is_timestamp("1985-04-12 23:20:50Z"));
        assert!(!is_timestamp("1985-04-12"));
        assert!(!is_timestamp("not a timestamp"));
    }

    #[test]
    fn schema_path_is_restored_after_early_stop() {
        let schema = Schema::new(Form::Elements(Box::new(Schema::new(Form::Type(
            Type::String,
        )))));
        let config = ValidatorConfig {
            max_depth: 0,
            max_errors: 1,
        };
        let mut vm = Vm {
            config,
            root: &schema,
            instance_path: Vec::new(),
            schema_path: Vec::new(),
            depth: 0,
            errors: Vec::new(),
        };

        let step = vm.eval(&schema, &json!([1, 2]), None);
        assert!(matches!(step, ControlFlow::Break(Halt::ErrorLimit)));
        assert!(vm.instance_path.is_empty());
        assert!(vm.schema_path.is_empty());
        assert_eq!(vm.errors, vec![ValidationError::new(["0"], ["elements", "type"])]);
    }
}
