//! Constraint checks over type-checked requests.
//!
//! Required members and table-name lengths are checked first and fail alone.
//! Everything else is collected in one depth-first pass and reported together,
//! capped at ten entries.

use serde_json::{Map, Value};

use localddb_model::error::DynamoDBError;

use super::shape::{Constraint, Member, Shape, ShapeKind};

const MAX_REPORTED: usize = 10;

/// Check required members and table-name lengths, in member order.
pub fn check_required(members: &[Member], body: &Map<String, Value>) -> Result<(), DynamoDBError> {
    for member in members {
        let value = body.get(member.name);
        if member.required && value.is_none() {
            return Err(DynamoDBError::validation(format!(
                "The paramater '{}' is required but was not present in the request",
                member.name
            )));
        }
        if member.table_name {
            if let Some(name) = value.and_then(Value::as_str) {
                let len = utf16_len(name);
                if !(3..=255).contains(&len) {
                    return Err(DynamoDBError::validation(format!(
                        "{} must be at least 3 characters long and at most 255 characters long",
                        member.name
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Run every declared constraint and report all violations at once.
pub fn check_constraints(
    members: &[Member],
    body: &Map<String, Value>,
) -> Result<(), DynamoDBError> {
    let mut violations = Vec::new();
    check_members(members, Some(body), None, &mut violations);

    if violations.is_empty() {
        return Ok(());
    }
    let count = violations.len();
    Err(DynamoDBError::validation(format!(
        "{count} validation error{} detected: {}",
        if count > 1 { "s" } else { "" },
        violations.join("; ")
    )))
}

fn check_members(
    members: &[Member],
    data: Option<&Map<String, Value>>,
    parent: Option<&str>,
    violations: &mut Vec<String>,
) {
    for member in members {
        let value = data.and_then(|d| d.get(member.name));
        check_field(member.name, value, &member.shape, parent, violations);
    }
}

fn check_field(
    attr: &str,
    value: Option<&Value>,
    shape: &Shape,
    parent: Option<&str>,
    violations: &mut Vec<String>,
) {
    let path = match parent {
        Some(parent) => format!("{parent}.{}", lower_first(attr)),
        None => lower_first(attr),
    };

    for constraint in &shape.constraints {
        if violations.len() >= MAX_REPORTED {
            return;
        }
        if let Some(message) = violated(constraint, value) {
            violations.push(format!(
                "Value {} at '{path}' failed to satisfy constraint: {message}",
                render_value(value)
            ));
        }
    }

    if violations.len() >= MAX_REPORTED {
        return;
    }
    let Some(value) = value else {
        return;
    };
    match &shape.kind {
        ShapeKind::List(element) => {
            for (i, item) in value.as_array().into_iter().flatten().enumerate() {
                let parent = format!("{path}.{}", i + 1);
                check_field("member", Some(item), element, Some(&parent), violations);
            }
        }
        ShapeKind::Map(entry) => {
            for (key, item) in value.as_object().into_iter().flatten() {
                let parent = format!("{path}.{key}");
                check_field("member", Some(item), entry, Some(&parent), violations);
            }
        }
        ShapeKind::Structure(members) => {
            check_members(members, value.as_object(), Some(&path), violations);
        }
        _ => {}
    }
}

#[allow(clippy::cast_precision_loss)]
fn violated(constraint: &Constraint, value: Option<&Value>) -> Option<String> {
    let Some(value) = value else {
        return matches!(constraint, Constraint::NotNull)
            .then(|| "Member must not be null".to_owned());
    };
    match *constraint {
        Constraint::NotNull => None,
        Constraint::GreaterThanOrEqual(bound) => value
            .as_f64()
            .filter(|n| *n < bound as f64)
            .map(|_| format!("Member must have value greater than or equal to {bound}")),
        Constraint::LessThanOrEqual(bound) => value
            .as_f64()
            .filter(|n| *n > bound as f64)
            .map(|_| format!("Member must have value less than or equal to {bound}")),
        Constraint::LengthGreaterThanOrEqual(bound) => length(value)
            .filter(|len| *len < bound)
            .map(|_| format!("Member must have length greater than or equal to {bound}")),
        Constraint::LengthLessThanOrEqual(bound) => length(value)
            .filter(|len| *len > bound)
            .map(|_| format!("Member must have length less than or equal to {bound}")),
        Constraint::Enum(allowed) => value
            .as_str()
            .filter(|s| !allowed.contains(s))
            .map(|_| {
                format!(
                    "Member must satisfy enum value set: [{}]",
                    allowed.join(", ")
                )
            }),
        Constraint::Pattern(regex) => value
            .as_str()
            .filter(|s| {
                !regex
                    .find(s)
                    .is_some_and(|m| m.start() == 0 && m.end() == s.len())
            })
            .map(|_| {
                format!(
                    "Member must satisfy regular expression pattern: {}",
                    regex.as_str()
                )
            }),
    }
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(utf16_len(s)),
        Value::Array(items) => Some(items.len()),
        Value::Object(entries) => Some(entries.len()),
        _ => None,
    }
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

/// Render a value the way constraint messages quote it.
fn render_value(value: Option<&Value>) -> String {
    value.map_or_else(|| "null".to_owned(), |v| format!("'{}'", render_inner(v)))
}

fn render_inner(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(render_inner).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Object(_) => value.to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
    }
}
