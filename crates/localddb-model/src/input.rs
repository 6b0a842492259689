//! Request shapes.
//!
//! Bodies are decoded into these only after validation, so a required
//! member that is absent here can only mean a caller built the input by
//! hand; such members fall back to their defaults.

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::{
    AttributeDefinition, GlobalSecondaryIndex, GlobalSecondaryIndexUpdate, Item,
    KeySchemaElement, KeysAndAttributes, LocalSecondaryIndex, ProvisionedThroughput,
    ReturnConsumedCapacity, ReturnItemCollectionMetrics, ReturnValue, WriteRequest,
};

/// `CreateTable` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreateTableInput {
    /// Types of every key attribute used by the table or its indexes.
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// New table name.
    pub table_name: String,
    /// Hash key, optionally followed by a range key.
    pub key_schema: Vec<KeySchemaElement>,
    /// Up to five local indexes.
    pub local_secondary_indexes: Vec<LocalSecondaryIndex>,
    /// Up to five global indexes.
    pub global_secondary_indexes: Vec<GlobalSecondaryIndex>,
    /// Table throughput.
    pub provisioned_throughput: ProvisionedThroughput,
}

/// `DeleteTable` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct DeleteTableInput {
    pub table_name: String,
}

/// `DescribeTable` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct DescribeTableInput {
    pub table_name: String,
}

/// `ListTables` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTablesInput {
    /// Listing resumes after this name; it need not exist.
    pub exclusive_start_table_name: Option<String>,
    /// Page size, 1 to 100.
    pub limit: Option<i64>,
}

/// `UpdateTable` request. At least one of the two changes is present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateTableInput {
    /// Table to change.
    pub table_name: String,
    /// New table throughput.
    pub provisioned_throughput: Option<ProvisionedThroughput>,
    /// Throughput changes for existing global indexes.
    #[serde(default)]
    pub global_secondary_index_updates: Vec<GlobalSecondaryIndexUpdate>,
}

/// `PutItem` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemInput {
    /// Target table.
    pub table_name: String,
    /// Full item, key attributes included.
    #[serde(default)]
    pub item: Item,
    /// `NONE` or `ALL_OLD`.
    pub return_values: Option<ReturnValue>,
    #[allow(missing_docs)]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    #[allow(missing_docs)]
    pub return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
}

/// `GetItem` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemInput {
    /// Source table.
    pub table_name: String,
    /// Primary key, and nothing else.
    #[serde(default)]
    pub key: Item,
    /// Attributes to return; all when empty.
    #[serde(default)]
    pub attributes_to_get: Vec<String>,
    /// Charge a full read instead of half.
    pub consistent_read: Option<bool>,
    #[allow(missing_docs)]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

/// `DeleteItem` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemInput {
    /// Target table.
    pub table_name: String,
    /// Primary key, and nothing else.
    #[serde(default)]
    pub key: Item,
    /// `NONE` or `ALL_OLD`.
    pub return_values: Option<ReturnValue>,
    #[allow(missing_docs)]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    #[allow(missing_docs)]
    pub return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
}

/// `BatchGetItem` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchGetItemInput {
    /// Keys to fetch, by table.
    #[serde(default)]
    pub request_items: HashMap<String, KeysAndAttributes>,
    #[allow(missing_docs)]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
}

/// `BatchWriteItem` request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchWriteItemInput {
    /// Puts and deletes, by table.
    #[serde(default)]
    pub request_items: HashMap<String, Vec<WriteRequest>>,
    #[allow(missing_docs)]
    pub return_consumed_capacity: Option<ReturnConsumedCapacity>,
    #[allow(missing_docs)]
    pub return_item_collection_metrics: Option<ReturnItemCollectionMetrics>,
}
