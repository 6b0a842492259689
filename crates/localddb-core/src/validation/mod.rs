//! Request validation.
//!
//! A request passes through four stages, each of which stops at its first
//! failure:
//!
//! 1. [`typecheck`]: wire types, yielding a cleaned copy of the body.
//! 2. [`constraints::check_required`]: required members and table-name lengths.
//! 3. [`constraints::check_constraints`]: every declared constraint, aggregated.
//! 4. [`actions::check_action`]: action-specific rules and attribute values.

pub mod actions;
pub mod constraints;
pub mod shape;
pub mod typecheck;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use localddb_model::error::DynamoDBError;
use localddb_model::operations::DynamoDBOperation;

use crate::config::DynamoDBConfig;
use crate::error::internal_failure;

/// Validate a request body for `op`, returning the cleaned body.
pub fn validate_request(
    op: DynamoDBOperation,
    body: Value,
    config: &DynamoDBConfig,
) -> Result<Map<String, Value>, DynamoDBError> {
    let members = actions::members(op);
    let mut body = typecheck::check_structure(members, body)?;
    constraints::check_required(members, &body)?;
    constraints::check_constraints(members, &body)?;
    actions::check_action(op, &mut body, config)?;
    debug!(operation = %op, "request validated");
    Ok(body)
}

/// Decode a validated body into its typed input.
///
/// Validation leaves only bodies that fit their input type, so a failure
/// here is an internal fault.
pub fn decode<T: DeserializeOwned>(body: Map<String, Value>) -> Result<T, DynamoDBError> {
    serde_json::from_value(Value::Object(body))
        .map_err(|e| internal_failure("decode validated request", e))
}
