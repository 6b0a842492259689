//! Response shapes.
//!
//! Optional members are left out when unset. Batch responses always carry
//! their `Responses` and `Unprocessed*` maps.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::{ConsumedCapacity, Item, KeysAndAttributes, TableDescription, WriteRequest};

/// `CreateTable` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct CreateTableOutput {
    pub table_description: TableDescription,
}

/// `DeleteTable` response; the table as it enters `DELETING`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct DeleteTableOutput {
    pub table_description: TableDescription,
}

/// `DescribeTable` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeTableOutput {
    /// Note the member is `Table`, not `TableDescription`.
    pub table: TableDescription,
}

/// `UpdateTable` response; the table as it enters `UPDATING`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
#[allow(missing_docs)]
pub struct UpdateTableOutput {
    pub table_description: TableDescription,
}

/// `ListTables` response.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTablesOutput {
    /// Names in ascending order.
    pub table_names: Vec<String>,
    /// Set only when more names remain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_evaluated_table_name: Option<String>,
}

/// `PutItem` response.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemOutput {
    /// Replaced item, for `ALL_OLD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub consumed_capacity: Option<ConsumedCapacity>,
}

/// `GetItem` response.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemOutput {
    /// Found item after projection; may be `{}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item: Option<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub consumed_capacity: Option<ConsumedCapacity>,
}

/// `DeleteItem` response.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemOutput {
    /// Deleted item, for `ALL_OLD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Item>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub consumed_capacity: Option<ConsumedCapacity>,
}

/// `BatchGetItem` response.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchGetItemOutput {
    /// One entry per requested table, hits or not.
    pub responses: HashMap<String, Vec<Item>>,
    /// Keys left over once the response budget ran out.
    pub unprocessed_keys: HashMap<String, KeysAndAttributes>,
    /// One entry per table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<Vec<ConsumedCapacity>>,
}

/// `BatchWriteItem` response.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BatchWriteItemOutput {
    /// Requests left over once the write budget ran out.
    pub unprocessed_items: HashMap<String, Vec<WriteRequest>>,
    /// One entry per table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumed_capacity: Option<Vec<ConsumedCapacity>>,
}
