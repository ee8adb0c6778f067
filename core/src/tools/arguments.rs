//! Typed tool arguments checked against an operation's input schema
//!
//! The planner gets an untyped JSON object back from the model. Before it is
//! forwarded to a tool server every declared property is converted into an
//! [`ArgumentValue`] of the declared type, so a malformed call fails here
//! with an [`ArgumentError`] instead of inside the tool process.

use crate::error::ArgumentError;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A single argument value, tagged by its JSON schema type
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Number(Number),
    String(String),
    Array(Vec<ArgumentValue>),
    Object(BTreeMap<String, ArgumentValue>),
}

impl ArgumentValue {
    /// Structural conversion for values without a declared type
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ArgumentValue::Null,
            Value::Bool(b) => ArgumentValue::Boolean(*b),
            Value::Number(n) => ArgumentValue::Number(n.clone()),
            Value::String(s) => ArgumentValue::String(s.clone()),
            Value::Array(items) => ArgumentValue::Array(items.iter().map(Self::from_json).collect()),
            Value::Object(map) => ArgumentValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to JSON for the wire
    pub fn to_json(&self) -> Value {
        match self {
            ArgumentValue::Null => Value::Null,
            ArgumentValue::Boolean(b) => Value::Bool(*b),
            ArgumentValue::Integer(i) => Value::Number((*i).into()),
            ArgumentValue::Number(n) => Value::Number(n.clone()),
            ArgumentValue::String(s) => Value::String(s.clone()),
            ArgumentValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            ArgumentValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentValue::Null => write!(f, "null"),
            ArgumentValue::Boolean(b) => write!(f, "{}", b),
            ArgumentValue::Integer(i) => write!(f, "{}", i),
            ArgumentValue::Number(n) => write!(f, "{}", n),
            ArgumentValue::String(s) => write!(f, "{}", s),
            ArgumentValue::Array(_) | ArgumentValue::Object(_) => write!(f, "{}", self.to_json()),
        }
    }
}

/// Arguments that passed schema validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments(BTreeMap<String, ArgumentValue>);

impl ValidatedArguments {
    /// Get an argument by name
    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.0.get(name)
    }

    /// Render one argument for display, `None` when absent
    pub fn display(&self, name: &str) -> Option<String> {
        self.get(name).map(ToString::to_string)
    }

    /// Number of arguments
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// The JSON object sent to the tool server
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, ArgumentValue)> for ValidatedArguments {
    fn from_iter<I: IntoIterator<Item = (String, ArgumentValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Validate raw model-produced arguments against an input schema
pub fn validate_arguments(schema: &Value, raw: &Value) -> Result<ValidatedArguments, ArgumentError> {
    let object = raw.as_object().ok_or_else(|| ArgumentError::NotAnObject {
        found: json_type_name(raw).to_string(),
    })?;

    validate_object("", schema, object).map(ValidatedArguments)
}

fn validate_object(
    prefix: &str,
    schema: &Value,
    object: &Map<String, Value>,
) -> Result<BTreeMap<String, ArgumentValue>, ArgumentError> {
    let properties = schema.get("properties").and_then(Value::as_object);
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for name in &required {
        if !object.contains_key(*name) {
            return Err(ArgumentError::MissingRequired {
                name: qualified(prefix, name),
            });
        }
    }

    let mut validated = BTreeMap::new();
    for (name, value) in object {
        let path = qualified(prefix, name);
        match properties.and_then(|props| props.get(name)) {
            Some(property) => {
                // Models like to send explicit nulls for optional fields
                if value.is_null() && !required.contains(&name.as_str()) && !allows_null(property)
                {
                    continue;
                }
                validated.insert(name.clone(), convert(&path, property, value)?);
            }
            None if closed && properties.is_some() => {
                return Err(ArgumentError::Unexpected { name: path });
            }
            None => {
                validated.insert(name.clone(), ArgumentValue::from_json(value));
            }
        }
    }

    Ok(validated)
}

fn convert(path: &str, schema: &Value, value: &Value) -> Result<ArgumentValue, ArgumentError> {
    let types = declared_types(schema);
    if types.is_empty() {
        return Ok(ArgumentValue::from_json(value));
    }

    for ty in &types {
        if let Some(converted) = convert_as(path, ty, schema, value)? {
            return Ok(converted);
        }
    }

    Err(ArgumentError::TypeMismatch {
        name: path.to_string(),
        expected: types.join(" or "),
        found: json_type_name(value).to_string(),
    })
}

/// `Ok(None)` means "not this type, try the next one"
fn convert_as(
    path: &str,
    ty: &str,
    schema: &Value,
    value: &Value,
) -> Result<Option<ArgumentValue>, ArgumentError> {
    let converted = match (ty, value) {
        ("string", Value::String(s)) => Some(ArgumentValue::String(s.clone())),

        ("number", Value::Number(n)) => Some(ArgumentValue::Number(n.clone())),
        ("number", Value::String(s)) => serde_json::from_str::<Number>(s.trim())
            .ok()
            .map(ArgumentValue::Number),

        ("integer", Value::Number(n)) => integer_from_number(n).map(ArgumentValue::Integer),
        ("integer", Value::String(s)) => s.trim().parse::<i64>().ok().map(ArgumentValue::Integer),

        ("boolean", Value::Bool(b)) => Some(ArgumentValue::Boolean(*b)),
        ("boolean", Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Some(ArgumentValue::Boolean(true)),
            "false" => Some(ArgumentValue::Boolean(false)),
            _ => None,
        },

        ("null", Value::Null) => Some(ArgumentValue::Null),

        ("array", Value::Array(items)) => {
            let item_schema = schema.get("items");
            let mut converted = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = format!("{}[{}]", path, i);
                converted.push(match item_schema {
                    Some(item_schema) => convert(&item_path, item_schema, item)?,
                    None => ArgumentValue::from_json(item),
                });
            }
            Some(ArgumentValue::Array(converted))
        }

        ("object", Value::Object(map)) => Some(ArgumentValue::Object(validate_object(path, schema, map)?)),

        // Unknown schema types are passed through untouched
        (other, _) if !KNOWN_TYPES.contains(&other) => Some(ArgumentValue::from_json(value)),

        _ => None,
    };

    Ok(converted)
}

const KNOWN_TYPES: &[&str] = &["string", "number", "integer", "boolean", "null", "array", "object"];

fn declared_types(schema: &Value) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(ty)) => vec![ty.as_str()],
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

fn allows_null(schema: &Value) -> bool {
    let types = declared_types(schema);
    types.is_empty() || types.contains(&"null")
}

fn integer_from_number(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    n.as_f64()
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

fn qualified(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
