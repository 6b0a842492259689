//! Attribute value validation and normalization.
//!
//! Runs over type-checked request JSON, before it is decoded into
//! [`AttributeValue`](localddb_model::AttributeValue). Every check returns the
//! first violation found with the service's exact message, and number tokens
//! are rewritten in place to their canonical fixed-point text so equal numbers
//! compare, hash and size the same everywhere downstream.

use std::collections::HashSet;

use serde_json::{Map, Value};

use localddb_model::error::DynamoDBError;

use crate::error::number_error_to_dynamodb;
use crate::number::Number;

/// Message for an attribute value with no datatype set.
pub const EMPTY_VALUE: &str =
    "Supplied AttributeValue is empty, must contain exactly one of the supported datatypes";
/// Message for an attribute value with several datatypes set.
pub const MULTIPLE_TYPES: &str = "Supplied AttributeValue has more than one datatypes set, \
                              must contain exactly one of the supported datatypes";

/// Validate every attribute value of an item or key object.
pub fn validate_attribute_map(map: &mut Map<String, Value>) -> Result<(), DynamoDBError> {
    for value in map.values_mut() {
        validate_attribute_value(value)?;
    }
    Ok(())
}

/// Validate a single attribute value, normalizing its numbers.
pub fn validate_attribute_value(value: &mut Value) -> Result<(), DynamoDBError> {
    let Some(obj) = value.as_object_mut() else {
        return Err(DynamoDBError::validation(EMPTY_VALUE));
    };
    if obj.is_empty() {
        return Err(DynamoDBError::validation(EMPTY_VALUE));
    }

    for (ty, inner) in obj.iter_mut() {
        check_datatype(ty, inner)?;
    }

    if obj.len() > 1 {
        return Err(DynamoDBError::validation(MULTIPLE_TYPES));
    }
    Ok(())
}

fn check_datatype(ty: &str, inner: &mut Value) -> Result<(), DynamoDBError> {
    match ty {
        "N" => normalize_number(inner)?,
        "B" if is_empty_str(inner) => {
            return Err(invalid(
                "An AttributeValue may not contain a null or empty binary type.",
            ));
        }
        "S" if is_empty_str(inner) => {
            return Err(invalid("An AttributeValue may not contain an empty string."));
        }
        "NULL" if inner.as_bool() != Some(true) => {
            return Err(invalid(
                "Null attribute value types must have the value of true",
            ));
        }
        "SS" => {
            let members = set_members(inner);
            if members.is_empty() {
                return Err(invalid("An string set  may not be empty"));
            }
            if members.iter().any(|m| is_empty_str(m)) {
                return Err(invalid(
                    "An string set may not have a empty string as a member",
                ));
            }
            if has_duplicates(members) {
                return Err(invalid(&format!(
                    "Input collection {} contains duplicates.",
                    render_members(members)
                )));
            }
        }
        "NS" => {
            let members = set_members_mut(inner);
            if members.is_empty() {
                return Err(invalid("An number set  may not be empty"));
            }
            for member in members.iter_mut() {
                normalize_number(member)?;
            }
            if has_duplicates(members) {
                return Err(DynamoDBError::validation(
                    "Input collection contains duplicates",
                ));
            }
        }
        "BS" => {
            let members = set_members(inner);
            if members.is_empty() {
                return Err(invalid("Binary sets should not be empty"));
            }
            if members.iter().any(|m| is_empty_str(m)) {
                return Err(invalid(
                    "Binary sets may not contain null or empty values",
                ));
            }
            if has_duplicates(members) {
                return Err(invalid(&format!(
                    "Input collection {}of type BS contains duplicates.",
                    render_members(members)
                )));
            }
        }
        "M" => {
            if let Some(map) = inner.as_object_mut() {
                validate_attribute_map(map)?;
            }
        }
        "L" => {
            if let Some(list) = inner.as_array_mut() {
                for element in list {
                    validate_attribute_value(element)?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn normalize_number(token: &mut Value) -> Result<(), DynamoDBError> {
    let text = token.as_str().unwrap_or_default();
    let number = Number::parse(text).map_err(number_error_to_dynamodb)?;
    *token = Value::String(number.to_string());
    Ok(())
}

fn invalid(detail: &str) -> DynamoDBError {
    DynamoDBError::validation(format!(
        "One or more parameter values were invalid: {detail}"
    ))
}

fn is_empty_str(value: &Value) -> bool {
    value.as_str().is_none_or(str::is_empty)
}

fn set_members(value: &Value) -> &[Value] {
    value.as_array().map_or(&[], Vec::as_slice)
}

fn set_members_mut(value: &mut Value) -> &mut [Value] {
    value.as_array_mut().map_or(&mut [], Vec::as_mut_slice)
}

fn has_duplicates(members: &[Value]) -> bool {
    let mut seen = HashSet::with_capacity(members.len());
    !members.iter().all(|m| seen.insert(m.as_str().unwrap_or_default()))
}

fn render_members(members: &[Value]) -> String {
    let rendered: Vec<&str> = members.iter().map(|m| m.as_str().unwrap_or_default()).collect();
    format!("[{}]", rendered.join(", "))
}
