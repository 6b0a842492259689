//! DynamoDB model types for localddb.
//!
//! Hand-written wire types for the emulated DynamoDB JSON protocol: the
//! `AttributeValue` sum type, the error taxonomy, the operation enum and the
//! typed inputs and outputs of every supported action.
// "DynamoDB" appears in virtually every doc comment in this crate.
#![allow(clippy::doc_markdown)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use attribute_value::AttributeValue;
pub use error::{DynamoDBError, DynamoDBErrorCode};
pub use operations::DynamoDBOperation;
