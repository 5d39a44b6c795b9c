//! Checks method parameters against the JSON-schema fragment declared for
//! the method. Supported keywords: `type`, `required`, `properties`,
//! `additionalProperties`, `items` and `enum`. Anything else is ignored.

use serde_json::{Map, Value};

/// First schema violation found in a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer of the offending field
    pub path: String,
    /// Keyword that failed
    pub code: &'static str,
    pub description: String,
}

pub fn validate(schema: &Value, value: &Value) -> Result<(), Violation> {
    check(schema, value, "")
}

fn check(schema: &Value, value: &Value, path: &str) -> Result<(), Violation> {
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    if let Some(expected) = schema.get("type") {
        let allowed: Vec<&str> = match expected {
            Value::String(name) => vec![name.as_str()],
            Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        };

        if !allowed.is_empty() && !allowed.iter().any(|name| has_type(value, name)) {
            return Err(Violation {
                path: path.to_owned(),
                code: "type",
                description: format!("must be {}", allowed.join(" or ")),
            });
        }
    }

    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            return Err(Violation {
                path: path.to_owned(),
                code: "enum",
                description: "must be equal to one of the allowed values".to_owned(),
            });
        }
    }

    match value {
        Value::Object(object) => check_object(schema, object, path),
        Value::Array(items) => match schema.get("items") {
            Some(item_schema) => items
                .iter()
                .enumerate()
                .try_for_each(|(index, item)| {
                    check(item_schema, item, &format!("{path}/{index}"))
                }),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

fn check_object(
    schema: &Map<String, Value>,
    object: &Map<String, Value>,
    path: &str,
) -> Result<(), Violation> {
    if let Some(Value::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(name) {
                return Err(Violation {
                    path: pointer(path, name),
                    code: "required",
                    description: format!("must have required property '{name}'"),
                });
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);

    for (name, value) in object {
        let field_path = pointer(path, name);

        match properties.and_then(|properties| properties.get(name)) {
            Some(property_schema) => check(property_schema, value, &field_path)?,
            None => match schema.get("additionalProperties") {
                Some(Value::Bool(false)) => {
                    return Err(Violation {
                        path: field_path,
                        code: "additionalProperties",
                        description: format!("must NOT have additional property '{name}'"),
                    })
                }
                Some(extra @ Value::Object(_)) => check(extra, value, &field_path)?,
                _ => {}
            },
        }
    }

    Ok(())
}

fn has_type(value: &Value, name: &str) -> bool {
    match name {
        "null" => value.is_null(),
        "boolean" => value.is_boolean(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|number| number.fract() == 0.0)
        }
        "array" => value.is_array(),
        "object" => value.is_object(),
        _ => true,
    }
}

fn pointer(parent: &str, segment: &str) -> String {
    format!("{parent}/{}", segment.replace('~', "~0").replace('/', "~1"))
}
