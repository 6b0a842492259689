//! Fail-fast wire type checking.
//!
//! Walks a request in shape declaration order and returns a cleaned copy:
//! unknown structure members and `null`s are dropped, fractional integers are
//! floored, and base64 text is verified. The first mismatch aborts the walk
//! with a `SerializationException`.

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde_json::{Map, Number, Value};

use localddb_model::error::DynamoDBError;

use super::shape::{Member, Shape, ShapeKind};

static BASE64_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^a-zA-Z0-9+/=]|=[^=]").expect("base64 pattern is valid"));

/// Members of an attribute value, in the order they are checked.
static ATTRIBUTE_VALUE_MEMBERS: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        Member::new("S", Shape::string()),
        Member::new("B", Shape::blob()),
        Member::new("N", Shape::string()),
        Member::new("BOOL", Shape::boolean()),
        Member::new("NULL", Shape::boolean()),
        Member::new("SS", Shape::list(Shape::string())),
        Member::new("NS", Shape::list(Shape::string())),
        Member::new("BS", Shape::list(Shape::blob())),
        Member::new("L", Shape::list(Shape::attribute_value())),
        Member::new("M", Shape::attribute_map()),
    ]
});

type TypeResult<T> = Result<T, DynamoDBError>;

fn type_error(message: impl Into<String>) -> DynamoDBError {
    DynamoDBError::serialization_exception(message)
}

/// Type-check a structure body against its members.
pub fn check_structure(members: &[Member], value: Value) -> TypeResult<Map<String, Value>> {
    let mut input = match value {
        Value::Object(map) => map,
        Value::Array(_) => return Err(type_error("Start of list found where not expected")),
        _ => return Err(type_error("Unexpected value type in payload")),
    };

    let mut cleaned = Map::new();
    for member in members {
        let Some(field) = input.remove(member.name) else {
            continue;
        };
        if let Some(checked) = check_value(field, &member.shape)? {
            cleaned.insert(member.name.to_owned(), checked);
        }
    }
    Ok(cleaned)
}

fn check_value(value: Value, shape: &Shape) -> TypeResult<Option<Value>> {
    if value.is_null() {
        return Ok(None);
    }
    let checked = match &shape.kind {
        ShapeKind::Boolean => check_boolean(value)?,
        ShapeKind::Long => check_integral(value, "Long")?,
        ShapeKind::Integer => check_integral(value, "Integer")?,
        ShapeKind::String => check_string(value)?,
        ShapeKind::Blob => check_blob(value)?,
        ShapeKind::List(element) => check_list(value, element)?,
        ShapeKind::Map(entry) => check_map(value, entry)?,
        ShapeKind::Structure(members) => Value::Object(check_structure(members, value)?),
        ShapeKind::AttributeValue => {
            Value::Object(check_structure(&ATTRIBUTE_VALUE_MEMBERS, value)?)
        }
    };
    Ok(Some(checked))
}

fn number_class(n: &Number) -> &'static str {
    match n.as_f64() {
        Some(f) if !n.is_i64() && !n.is_u64() && f.fract() != 0.0 => "java.lang.Double",
        _ => "java.lang.Long",
    }
}

fn scalar_container_error(value: &Value) -> Option<DynamoDBError> {
    match value {
        Value::Array(_) => Some(type_error("Start of list found where not expected")),
        Value::Object(_) => Some(type_error(
            "Start of structure or map found where not expected.",
        )),
        _ => None,
    }
}

fn check_boolean(value: Value) -> TypeResult<Value> {
    if let Some(err) = scalar_container_error(&value) {
        return Err(err);
    }
    match value {
        Value::Number(n) => Err(type_error(format!(
            "class {} can not be converted to an Boolean",
            number_class(&n)
        ))),
        Value::String(s) => Err(type_error(format!(
            "'{}' can not be converted to an Boolean",
            s.to_uppercase()
        ))),
        other => Ok(other),
    }
}

fn check_integral(value: Value, type_name: &str) -> TypeResult<Value> {
    if let Some(err) = scalar_container_error(&value) {
        return Err(err);
    }
    match value {
        Value::Bool(_) => Err(type_error(format!(
            "class java.lang.Boolean can not be converted to an {type_name}"
        ))),
        Value::String(_) => Err(type_error(format!(
            "class java.lang.String can not be converted to an {type_name}"
        ))),
        Value::Number(n) => Ok(Value::Number(floor_number(n))),
        other => Ok(other),
    }
}

/// Floors to an `i64`. Values outside its range saturate, so the bound
/// checks further down report them instead of the decoder.
#[allow(clippy::cast_possible_truncation)]
fn floor_number(n: Number) -> Number {
    if n.is_i64() {
        return n;
    }
    if n.is_u64() {
        return Number::from(i64::MAX);
    }
    Number::from(n.as_f64().unwrap_or_default().floor() as i64)
}

fn check_string(value: Value) -> TypeResult<Value> {
    if let Some(err) = scalar_container_error(&value) {
        return Err(err);
    }
    match value {
        Value::Bool(_) => Err(type_error(
            "class java.lang.Boolean can not be converted to a String",
        )),
        Value::Number(n) => Err(type_error(format!(
            "class {} can not be converted to a String",
            number_class(&n)
        ))),
        other => Ok(other),
    }
}

fn check_blob(value: Value) -> TypeResult<Value> {
    if let Some(err) = scalar_container_error(&value) {
        return Err(err);
    }
    let text = match value {
        Value::Bool(_) => {
            return Err(type_error(
                "class java.lang.Boolean can not be converted to a Blob",
            ));
        }
        Value::Number(n) => {
            return Err(type_error(format!(
                "class {} can not be converted to a Blob",
                number_class(&n)
            )));
        }
        Value::String(s) => s,
        other => return Ok(other),
    };

    let len = text.len();
    if len % 4 != 0 {
        return Err(type_error(format!(
            "'{text}' can not be converted to a Blob: \
             Base64 encoded length is expected a multiple of 4 bytes but found: {len}"
        )));
    }
    if let Some(found) = BASE64_INVALID.find(&text) {
        let c = found.as_str().chars().next().unwrap_or('=');
        return Err(type_error(format!(
            "'{text}' can not be converted to a Blob: Invalid Base64 character: '{c}'"
        )));
    }
    let canonical = STANDARD
        .decode(&text)
        .map(|bytes| STANDARD.encode(bytes) == text)
        .unwrap_or(false);
    if !canonical {
        return Err(type_error(format!(
            "'{text}' can not be converted to a Blob: \
             Invalid last non-pad Base64 character dectected"
        )));
    }
    Ok(Value::String(text))
}

fn check_list(value: Value, element: &Shape) -> TypeResult<Value> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(_) => {
            return Err(type_error(
                "Start of structure or map found where not expected.",
            ));
        }
        _ => return Err(type_error("Unexpected field type")),
    };
    let mut checked = Vec::with_capacity(items.len());
    for item in items {
        if let Some(v) = check_value(item, element)? {
            checked.push(v);
        }
    }
    Ok(Value::Array(checked))
}

fn check_map(value: Value, entry: &Shape) -> TypeResult<Value> {
    let entries = match value {
        Value::Object(entries) => entries,
        Value::Array(_) => return Err(type_error("Start of list found where not expected")),
        _ => return Err(type_error("Unexpected field type")),
    };
    let mut checked = Map::with_capacity(entries.len());
    for (key, v) in entries {
        if let Some(v) = check_value(v, entry)? {
            checked.insert(key, v);
        }
    }
    Ok(Value::Object(checked))
}
