//! Request entry point: action name plus JSON body in, status plus JSON body out.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use localddb_model::error::DynamoDBError;
use localddb_model::operations::DynamoDBOperation;

use crate::error::internal_failure;
use crate::provider::LocalDynamoDB;
use crate::validation::{decode, validate_request};

/// Outcome of one action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    /// HTTP status the service would answer with.
    pub status: http::StatusCode,
    /// Response document, or the error body.
    pub body: Value,
}

impl ActionResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    fn from_error(err: &DynamoDBError) -> Self {
        Self {
            status: err.status_code,
            body: err.to_body(),
        }
    }
}

/// Run one action against the provider.
///
/// Due lifecycle transitions are applied first, so every request observes
/// table states that are current as of its arrival.
pub fn handle_action(provider: &LocalDynamoDB, action: &str, body: Value) -> ActionResponse {
    let result = DynamoDBOperation::from_name(action)
        .ok_or_else(DynamoDBError::unknown_operation)
        .and_then(|op| {
            provider.tick();
            dispatch(provider, op, body)
        });
    match result {
        Ok(body) => ActionResponse {
            status: http::StatusCode::OK,
            body,
        },
        Err(err) => {
            if provider.config().verbose_errors {
                info!(action, code = %err.code, message = %err.message, "request rejected");
            } else {
                debug!(action, code = %err.code, "request rejected");
            }
            ActionResponse::from_error(&err)
        }
    }
}

/// Run one action from a raw request body.
pub fn handle_raw_action(provider: &LocalDynamoDB, action: &str, body: &[u8]) -> ActionResponse {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => handle_action(provider, action, value),
        Err(e) => {
            debug!(action, error = %e, "request body is not JSON");
            let err = DynamoDBError::serialization_exception("Unexpected value type in payload")
                .with_source(e);
            ActionResponse::from_error(&err)
        }
    }
}

/// Dispatch a validated operation to the matching provider method.
fn dispatch(
    provider: &LocalDynamoDB,
    op: DynamoDBOperation,
    body: Value,
) -> Result<Value, DynamoDBError> {
    let body = validate_request(op, body, provider.config())?;
    debug!(operation = %op, "dispatching");

    match op {
        DynamoDBOperation::CreateTable => {
            let input = decode(body)?;
            let output = provider.handle_create_table(input)?;
            serialize(&output)
        }
        DynamoDBOperation::DeleteTable => {
            let input = decode(body)?;
            let output = provider.handle_delete_table(input)?;
            serialize(&output)
        }
        DynamoDBOperation::DescribeTable => {
            let input = decode(body)?;
            let output = provider.handle_describe_table(input)?;
            serialize(&output)
        }
        DynamoDBOperation::ListTables => {
            let input = decode(body)?;
            let output = provider.handle_list_tables(input)?;
            serialize(&output)
        }
        DynamoDBOperation::UpdateTable => {
            let input = decode(body)?;
            let output = provider.handle_update_table(input)?;
            serialize(&output)
        }
        DynamoDBOperation::PutItem => {
            let input = decode(body)?;
            let output = provider.handle_put_item(input)?;
            serialize(&output)
        }
        DynamoDBOperation::GetItem => {
            let input = decode(body)?;
            let output = provider.handle_get_item(input)?;
            serialize(&output)
        }
        DynamoDBOperation::DeleteItem => {
            let input = decode(body)?;
            let output = provider.handle_delete_item(input)?;
            serialize(&output)
        }
        DynamoDBOperation::BatchGetItem => {
            let input = decode(body)?;
            let output = provider.handle_batch_get_item(input)?;
            serialize(&output)
        }
        DynamoDBOperation::BatchWriteItem => {
            let input = decode(body)?;
            let output = provider.handle_batch_write_item(input)?;
            serialize(&output)
        }
    }
}

/// Serialize an output into the response document.
fn serialize<T: Serialize>(output: &T) -> Result<Value, DynamoDBError> {
    serde_json::to_value(output).map_err(|e| internal_failure("serialize response", e))
}
