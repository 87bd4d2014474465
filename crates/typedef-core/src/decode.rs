use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema::{Form, Schema};

/// Keyword groups that select a form, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormSignal {
    Ref,
    Type,
    Enum,
    Elements,
    Properties,
    Values,
    Discriminator,
}

impl FormSignal {
    const PRIORITY: [FormSignal; 7] = [
        FormSignal::Ref,
        FormSignal::Type,
        FormSignal::Enum,
        FormSignal::Elements,
        FormSignal::Properties,
        FormSignal::Values,
        FormSignal::Discriminator,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            FormSignal::Ref => &["ref"],
            FormSignal::Type => &["type"],
            FormSignal::Enum => &["enum"],
            FormSignal::Elements => &["elements"],
            FormSignal::Properties => &["properties", "optionalProperties", "additionalProperties"],
            FormSignal::Values => &["values"],
            FormSignal::Discriminator => &["discriminator"],
        }
    }

    fn present_in(self, object: &Map<String, Value>) -> Option<&'static str> {
        self.keywords()
            .iter()
            .copied()
            .find(|keyword| object.contains_key(*keyword))
    }
}

pub(crate) fn decode_schema(value: &Value) -> Result<Schema> {
    decode_at(value, "")
}

fn decode_at(value: &Value, path: &str) -> Result<Schema> {
    let Some(object) = value.as_object() else {
        return Err(invalid_at(
            path,
            format!("schema must be an object, found {}", kind_of(value)),
        ));
    };

    let definitions = match object.get("definitions") {
        None => None,
        Some(value) => Some(decode_schema_map(
            value,
            &format!("{path}/definitions"),
            "definitions",
        )?),
    };

    let form = decode_form(object, path)?;

    Ok(Schema { definitions, form })
}

fn decode_form(object: &Map<String, Value>, path: &str) -> Result<Form> {
    let mut detected: Option<(FormSignal, &'static str)> = None;
    for signal in FormSignal::PRIORITY {
        let Some(keyword) = signal.present_in(object) else {
            continue;
        };
        if let Some((_, first)) = detected {
            return Err(invalid_at(
                path,
                format!("invalid form: '{first}' and '{keyword}' cannot be combined"),
            ));
        }
        detected = Some((signal, keyword));
    }

    let Some((signal, _)) = detected else {
        return Ok(Form::Empty);
    };

    match signal {
        FormSignal::Ref => {
            let name = expect_string(&object["ref"], path, "ref")?;
            Ok(Form::Ref(name.to_string()))
        }
        FormSignal::Type => {
            let name = expect_string(&object["type"], path, "type")?;
            let ty = name
                .parse()
                .map_err(|_| invalid_at(path, format!("unknown type '{name}'")))?;
            Ok(Form::Type(ty))
        }
        FormSignal::Enum => decode_enum(&object["enum"], path),
        FormSignal::Elements => {
            let schema = decode_at(&object["elements"], &format!("{path}/elements"))?;
            Ok(Form::Elements(Box::new(schema)))
        }
        FormSignal::Properties => decode_properties(object, path),
        FormSignal::Values => {
            let schema = decode_at(&object["values"], &format!("{path}/values"))?;
            Ok(Form::Values(Box::new(schema)))
        }
        FormSignal::Discriminator => decode_discriminator(&object["discriminator"], path),
    }
}

fn decode_enum(value: &Value, path: &str) -> Result<Form> {
    let Some(items) = value.as_array() else {
        return Err(invalid_at(path, "enum must be an array of strings"));
    };

    let mut values = BTreeSet::new();
    for (idx, item) in items.iter().enumerate() {
        let Some(item) = item.as_str() else {
            return Err(invalid_at(
                &format!("{path}/enum/{idx}"),
                format!("enum values must be strings, found {}", kind_of(item)),
            ));
        };
        if !values.insert(item.to_string()) {
            return Err(invalid_at(
                &format!("{path}/enum/{idx}"),
                format!("duplicate enum value '{item}'"),
            ));
        }
    }

    Ok(Form::Enum(values))
}

fn decode_properties(object: &Map<String, Value>, path: &str) -> Result<Form> {
    let required = match object.get("properties") {
        None => None,
        Some(value) => Some(decode_schema_map(
            value,
            &format!("{path}/properties"),
            "properties",
        )?),
    };

    let optional = match object.get("optionalProperties") {
        None => None,
        Some(value) => Some(decode_schema_map(
            value,
            &format!("{path}/optionalProperties"),
            "optionalProperties",
        )?),
    };

    let additional = match object.get("additionalProperties") {
        None => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(invalid_at(
                path,
                format!(
                    "additionalProperties must be a boolean, found {}",
                    kind_of(other)
                ),
            ));
        }
    };

    Ok(Form::Properties {
        required,
        optional,
        additional,
    })
}

fn decode_discriminator(value: &Value, path: &str) -> Result<Form> {
    let path = format!("{path}/discriminator");
    let Some(object) = value.as_object() else {
        return Err(invalid_at(
            &path,
            format!("discriminator must be an object, found {}", kind_of(value)),
        ));
    };

    let tag = match object.get("tag") {
        Some(value) => expect_string(value, &path, "tag")?.to_string(),
        None => return Err(invalid_at(&path, "discriminator requires a 'tag'")),
    };

    let mapping = match object.get("mapping") {
        Some(value) => decode_schema_map(value, &format!("{path}/mapping"), "mapping")?,
        None => return Err(invalid_at(&path, "discriminator requires a 'mapping'")),
    };

    Ok(Form::Discriminator { tag, mapping })
}

fn decode_schema_map(
    value: &Value,
    path: &str,
    keyword: &str,
) -> Result<BTreeMap<String, Schema>> {
    let Some(entries) = value.as_object() else {
        return Err(invalid_at(
            path,
            format!("{keyword} must be an object, found {}", kind_of(value)),
        ));
    };

    entries
        .iter()
        .map(|(name, value)| {
            let schema = decode_at(value, &format!("{path}/{name}"))?;
            Ok((name.clone(), schema))
        })
        .collect()
}

fn expect_string<'a>(value: &'a Value, path: &str, keyword: &str) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        invalid_at(
            path,
            format!("{keyword} must be a string, found {}", kind_of(value)),
        )
    })
}

fn invalid_at(path: &str, reason: impl AsRef<str>) -> Error {
    let location = if path.is_empty() { "/" } else { path };
    Error::invalid(format!("{} (at {location})", reason.as_ref()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
