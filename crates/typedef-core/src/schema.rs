use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::Result;
use crate::types::Type;

/// Compiled representation of one schema node.
///
/// Only the root of a schema tree may carry `definitions`; nested schemas
/// reach shared definitions through [`Form::Ref`], which is resolved by name
/// against the root at validation time. [`check_schema`](crate::check_schema)
/// enforces this and the other well-formedness rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub definitions: Option<BTreeMap<String, Schema>>,
    pub form: Form,
}

/// The active shape constraint of a schema. Exactly one is set.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Form {
    /// Accepts any instance.
    #[default]
    Empty,
    /// Delegates to the root definition with this name.
    Ref(String),
    /// Instance must be a primitive of the given type.
    Type(Type),
    /// Instance must be one of these strings.
    Enum(BTreeSet<String>),
    /// Instance must be an array whose elements all match the sub-schema.
    Elements(Box<Schema>),
    /// Instance must be an object with the given required and optional
    /// members. `None` means the keyword was absent from the schema.
    Properties {
        required: Option<BTreeMap<String, Schema>>,
        optional: Option<BTreeMap<String, Schema>>,
        additional: bool,
    },
    /// Instance must be an object whose values all match the sub-schema.
    Values(Box<Schema>),
    /// Instance must be an object whose `tag` member selects a branch.
    Discriminator {
        tag: String,
        mapping: BTreeMap<String, Schema>,
    },
}

impl Schema {
    /// A schema that accepts everything.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A schema without definitions.
    pub fn new(form: Form) -> Self {
        Self {
            definitions: None,
            form,
        }
    }

    /// A root schema carrying named definitions.
    pub fn with_definitions(definitions: BTreeMap<String, Schema>, form: Form) -> Self {
        Self {
            definitions: Some(definitions),
            form,
        }
    }

    /// Build a schema from an already-parsed JSON value.
    ///
    /// Fails with [`Error::InvalidSchema`](crate::Error::InvalidSchema) when
    /// the value is not a schema object, a keyword has the wrong shape, or
    /// more than one form is requested. The result has not been checked.
    pub fn from_json(value: &Value) -> Result<Self> {
        crate::decode::decode_schema(value)
    }

    /// Encode the schema back to its wire shape.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();

        if let Some(definitions) = &self.definitions {
            object.insert("definitions".to_string(), encode_map(definitions));
        }

        match &self.form {
            Form::Empty => {}
            Form::Ref(name) => {
                object.insert("ref".to_string(), Value::String(name.clone()));
            }
            Form::Type(ty) => {
                object.insert("type".to_string(), Value::String(ty.as_str().to_string()));
            }
            Form::Enum(values) => {
                let values = values.iter().cloned().map(Value::String).collect();
                object.insert("enum".to_string(), Value::Array(values));
            }
            Form::Elements(schema) => {
                object.insert("elements".to_string(), schema.to_json());
            }
            Form::Properties {
                required,
                optional,
                additional,
            } => {
                if let Some(required) = required {
                    object.insert("properties".to_string(), encode_map(required));
                }
                if let Some(optional) = optional {
                    object.insert("optionalProperties".to_string(), encode_map(optional));
                }
                if *additional || (required.is_none() && optional.is_none()) {
                    object.insert("additionalProperties".to_string(), Value::Bool(*additional));
                }
            }
            Form::Values(schema) => {
                object.insert("values".to_string(), schema.to_json());
            }
            Form::Discriminator { tag, mapping } => {
                let mut discriminator = Map::new();
                discriminator.insert("tag".to_string(), Value::String(tag.clone()));
                discriminator.insert("mapping".to_string(), encode_map(mapping));
                object.insert("discriminator".to_string(), Value::Object(discriminator));
            }
        }

        Value::Object(object)
    }

    /// Run the well-formedness checker with this schema as the root.
    pub fn check(&self) -> Result<()> {
        crate::check::check_schema(self)
    }
}

impl TryFrom<&Value> for Schema {
    type Error = crate::error::Error;

    fn try_from(value: &Value) -> Result<Self> {
        Schema::from_json(value)
    }
}

impl Form {
    /// Schema keyword that names this form, `None` for the empty form.
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Form::Empty => None,
            Form::Ref(_) => Some("ref"),
            Form::Type(_) => Some("type"),
            Form::Enum(_) => Some("enum"),
            Form::Elements(_) => Some("elements"),
            Form::Properties { .. } => Some("properties"),
            Form::Values(_) => Some("values"),
            Form::Discriminator { .. } => Some("discriminator"),
        }
    }
}

fn encode_map(schemas: &BTreeMap<String, Schema>) -> Value {
    Value::Object(
        schemas
            .iter()
            .map(|(name, schema)| (name.clone(), schema.to_json()))
            .collect(),
    )
}
