//! Core error conversions.

use localddb_model::error::{DynamoDBError, DynamoDBErrorCode};
use tracing::error;

/// Convert a storage error into a DynamoDB validation error.
///
/// Takes `e` by value because this is used as a closure argument to `.map_err()`.
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn storage_error_to_dynamodb(e: crate::storage::StorageError) -> DynamoDBError {
    DynamoDBError::with_message(DynamoDBErrorCode::ValidationException, e.to_string())
}

/// Convert a number parse error into a DynamoDB validation error.
#[must_use]
#[allow(clippy::needless_pass_by_value)]
pub fn number_error_to_dynamodb(e: crate::number::NumberError) -> DynamoDBError {
    DynamoDBError::with_message(DynamoDBErrorCode::ValidationException, e.to_string())
}

/// Report a broken internal invariant.
///
/// The failure is logged and surfaces to the caller as `InternalFailure`.
#[must_use]
pub fn internal_failure(
    context: &str,
    e: impl std::error::Error + Send + Sync + 'static,
) -> DynamoDBError {
    error!(context, error = %e, "internal failure");
    DynamoDBError::internal_error(format!("{context}: {e}")).with_source(e)
}
