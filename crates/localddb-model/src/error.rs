//! Exceptions returned to callers.
//!
//! A body is `{"__type": "<namespace>#<Name>", ...}`. Validation errors come
//! from the `com.amazon.coral.validate` namespace, protocol errors from
//! `com.amazon.coral.service`, and the rest from the DynamoDB service
//! namespace. `SerializationException` spells its message field `Message`,
//! and `UnknownOperationException` has none.

use std::fmt;

use http::StatusCode;
use serde_json::{Map, Value};

const DYNAMODB: &str = "com.amazonaws.dynamodb.v20120810";
const CORAL_SERVICE: &str = "com.amazon.coral.service";
const CORAL_VALIDATE: &str = "com.amazon.coral.validate";

/// Exception kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DynamoDBErrorCode {
    /// Duplicate table, or a table busy with another transition.
    ResourceInUseException,
    /// Missing table or index, or a table that is not `ACTIVE`.
    ResourceNotFoundException,
    /// Table count, concurrent transition or update-rate caps.
    LimitExceededException,
    /// Semantically invalid request.
    ValidationException,
    /// Request body does not match the wire types.
    SerializationException,
    /// Unrecognized action.
    UnknownOperationException,
    /// Broken internal invariant.
    InternalFailure,
}

impl DynamoDBErrorCode {
    fn name(self) -> &'static str {
        match self {
            Self::ResourceInUseException => "ResourceInUseException",
            Self::ResourceNotFoundException => "ResourceNotFoundException",
            Self::LimitExceededException => "LimitExceededException",
            Self::ValidationException => "ValidationException",
            Self::SerializationException => "SerializationException",
            Self::UnknownOperationException => "UnknownOperationException",
            Self::InternalFailure => "InternalFailure",
        }
    }

    fn namespace(self) -> &'static str {
        match self {
            Self::ValidationException => CORAL_VALIDATE,
            Self::SerializationException | Self::UnknownOperationException | Self::InternalFailure => {
                CORAL_SERVICE
            }
            _ => DYNAMODB,
        }
    }

    /// Value of the `__type` field.
    #[must_use]
    pub fn error_type(self) -> String {
        format!("{}#{}", self.namespace(), self.name())
    }

    /// HTTP status for this kind.
    #[must_use]
    pub fn status_code(self) -> StatusCode {
        if self == Self::InternalFailure {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        }
    }

    /// Body field holding the message, if any.
    #[must_use]
    pub fn message_field(self) -> Option<&'static str> {
        match self {
            Self::UnknownOperationException => None,
            Self::SerializationException => Some("Message"),
            _ => Some("message"),
        }
    }
}

impl fmt::Display for DynamoDBErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An exception on its way back to the caller.
#[derive(Debug)]
pub struct DynamoDBError {
    /// Kind.
    pub code: DynamoDBErrorCode,
    /// Message text, sent verbatim.
    pub message: String,
    /// HTTP status.
    pub status_code: StatusCode,
    /// Underlying cause, logged but never sent.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for DynamoDBError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for DynamoDBError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl DynamoDBError {
    /// Error of the given kind.
    #[must_use]
    pub fn with_message(code: DynamoDBErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status_code: code.status_code(),
            source: None,
        }
    }

    /// Attach a cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// JSON body for the response.
    #[must_use]
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("__type".to_owned(), Value::String(self.code.error_type()));
        if let Some(field) = self.code.message_field() {
            body.insert(field.to_owned(), Value::String(self.message.clone()));
        }
        Value::Object(body)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn resource_in_use(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::ResourceInUseException, message)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::ResourceNotFoundException, message)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn limit_exceeded(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::LimitExceededException, message)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::ValidationException, message)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn serialization_exception(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::SerializationException, message)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::with_message(DynamoDBErrorCode::InternalFailure, message)
    }

    /// Unrecognized action; rendered without a message.
    #[must_use]
    pub fn unknown_operation() -> Self {
        Self::with_message(DynamoDBErrorCode::UnknownOperationException, "")
    }
}
