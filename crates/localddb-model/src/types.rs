//! Table, index and request-option shapes shared by inputs and outputs.
//!
//! Wire enums are `SCREAMING_SNAKE_CASE` strings; structs are `PascalCase`.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::attribute_value::AttributeValue;

/// Attribute name to value, in the order the attributes were written.
pub type Item = IndexMap<String, AttributeValue>;

/// Role of a key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyType {
    /// Partition key.
    Hash,
    /// Sort key.
    Range,
}

/// Type of a key attribute as declared in `AttributeDefinitions`.
///
/// Anything other than `S`, `N` or `B` decodes to `Unknown` and is left for
/// validation to reject.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarAttributeType {
    /// String.
    S,
    /// Number.
    N,
    /// Binary.
    B,
    /// Unrecognized type tag.
    Unknown(String),
}

impl ScalarAttributeType {
    fn tag(&self) -> &str {
        match self {
            Self::S => "S",
            Self::N => "N",
            Self::B => "B",
            Self::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for ScalarAttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for ScalarAttributeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for ScalarAttributeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(match tag.as_str() {
            "S" => Self::S,
            "N" => Self::N,
            "B" => Self::B,
            _ => Self::Unknown(tag),
        })
    }
}

/// Table lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableStatus {
    /// Created, not yet usable.
    Creating,
    /// Usable.
    Active,
    /// Being removed.
    Deleting,
    /// Throughput or index change in flight.
    Updating,
}

impl TableStatus {
    /// Whether the table is mid-transition.
    #[must_use]
    pub fn is_transitional(&self) -> bool {
        *self != Self::Active
    }
}

/// Which attributes a secondary index carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionType {
    /// Every attribute.
    All,
    /// Table and index keys only.
    KeysOnly,
    /// Keys plus `NonKeyAttributes`.
    Include,
}

/// Global secondary index status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndexStatus {
    /// Being built.
    Creating,
    /// Throughput change in flight.
    Updating,
    /// Being removed.
    Deleting,
    /// Usable.
    Active,
}

/// `ReturnValues` option of write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnValue {
    /// Nothing.
    #[default]
    None,
    /// The replaced or deleted item.
    AllOld,
    /// Changed attributes, before the write.
    UpdatedOld,
    /// The item after the write.
    AllNew,
    /// Changed attributes, after the write.
    UpdatedNew,
}

/// `ReturnConsumedCapacity` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReturnConsumedCapacity {
    /// Total plus the table's share.
    Indexes,
    /// Total only.
    Total,
    /// Nothing.
    #[default]
    None,
}

impl ReturnConsumedCapacity {
    /// Whether any `ConsumedCapacity` is reported.
    #[must_use]
    pub fn should_report(&self) -> bool {
        *self != Self::None
    }

    /// Whether the `Table` breakdown is reported.
    #[must_use]
    pub fn should_report_indexes(&self) -> bool {
        *self == Self::Indexes
    }
}

/// `ReturnItemCollectionMetrics` option. Accepted, never acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReturnItemCollectionMetrics {
    /// Size statistics.
    Size,
    /// Nothing.
    #[default]
    None,
}

/// `{AttributeName, KeyType}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeySchemaElement {
    /// Key attribute.
    pub attribute_name: String,
    /// `HASH` or `RANGE`.
    pub key_type: KeyType,
}

/// `{AttributeName, AttributeType}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeDefinition {
    /// Attribute being declared.
    pub attribute_name: String,
    /// Declared type.
    pub attribute_type: ScalarAttributeType,
}

/// Requested read/write units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughput {
    /// Read units.
    pub read_capacity_units: i64,
    /// Write units.
    pub write_capacity_units: i64,
}

/// Current read/write units with change history.
///
/// Timestamps are epoch seconds and only appear once a change has happened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisionedThroughputDescription {
    /// Last increase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_increase_date_time: Option<f64>,
    /// Last decrease.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_decrease_date_time: Option<f64>,
    /// Decreases completed since UTC midnight.
    pub number_of_decreases_today: i64,
    /// Read units.
    pub read_capacity_units: i64,
    /// Write units.
    pub write_capacity_units: i64,
}

/// Index projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Projection {
    /// Projection kind; required by validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection_type: Option<ProjectionType>,
    /// Extra attributes for `INCLUDE`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_key_attributes: Vec<String>,
}

/// Global secondary index as given to `CreateTable`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalSecondaryIndex {
    /// Index name, unique within the table.
    pub index_name: String,
    /// Index key.
    pub key_schema: Vec<KeySchemaElement>,
    /// Projected attributes.
    pub projection: Projection,
    /// Index throughput.
    pub provisioned_throughput: ProvisionedThroughput,
}

/// Global secondary index as described back.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalSecondaryIndexDescription {
    /// Index name.
    pub index_name: String,
    /// `<table arn>/index/<name>`.
    pub index_arn: String,
    /// Projected bytes.
    pub index_size_bytes: i64,
    /// Lifecycle status.
    pub index_status: IndexStatus,
    /// Projected items.
    pub item_count: i64,
    /// Index key.
    pub key_schema: Vec<KeySchemaElement>,
    /// Projected attributes.
    pub projection: Projection,
    /// Index throughput.
    pub provisioned_throughput: ProvisionedThroughputDescription,
}

/// Local secondary index as given to `CreateTable`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalSecondaryIndex {
    /// Index name, unique within the table.
    pub index_name: String,
    /// Table hash key plus an alternate range key.
    pub key_schema: Vec<KeySchemaElement>,
    /// Projected attributes.
    pub projection: Projection,
}

/// Local secondary index as described back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocalSecondaryIndexDescription {
    /// Index name.
    pub index_name: String,
    /// `<table arn>/index/<name>`.
    pub index_arn: String,
    /// Projected bytes.
    pub index_size_bytes: i64,
    /// Projected items.
    pub item_count: i64,
    /// Index key.
    pub key_schema: Vec<KeySchemaElement>,
    /// Projected attributes.
    pub projection: Projection,
}

/// One entry of `GlobalSecondaryIndexUpdates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalSecondaryIndexUpdate {
    /// Throughput change; the only supported update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<UpdateGlobalSecondaryIndexAction>,
}

/// `{IndexName, ProvisionedThroughput}` for an index update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateGlobalSecondaryIndexAction {
    /// Existing index.
    pub index_name: String,
    /// New throughput.
    pub provisioned_throughput: ProvisionedThroughput,
}

/// The table document returned by the four table operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableDescription {
    /// As created.
    pub attribute_definitions: Vec<AttributeDefinition>,
    /// Epoch seconds.
    pub creation_date_time: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[allow(missing_docs)]
    pub global_secondary_indexes: Vec<GlobalSecondaryIndexDescription>,
    /// Stored items.
    pub item_count: i64,
    /// As created.
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[allow(missing_docs)]
    pub local_secondary_indexes: Vec<LocalSecondaryIndexDescription>,
    /// Current throughput.
    pub provisioned_throughput: ProvisionedThroughputDescription,
    /// `arn:aws:dynamodb:<region>:<account>:table/<name>`.
    pub table_arn: String,
    /// Random id assigned at creation.
    pub table_id: String,
    /// Table name.
    pub table_name: String,
    /// Sum of stored item sizes.
    pub table_size_bytes: i64,
    /// Lifecycle status.
    pub table_status: TableStatus,
}

/// `{CapacityUnits}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Capacity {
    /// Units consumed.
    pub capacity_units: f64,
}

/// Units one operation consumed against one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsumedCapacity {
    /// Total units.
    pub capacity_units: f64,
    /// Table charged.
    pub table_name: String,
    /// Table share, reported for `INDEXES` only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Capacity>,
}

/// Per-table entry of `BatchGetItem.RequestItems`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeysAndAttributes {
    /// Keys to fetch.
    pub keys: Vec<Item>,
    /// Projection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes_to_get: Vec<String>,
    /// Strongly consistent read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consistent_read: Option<bool>,
}

/// Entry of `BatchWriteItem.RequestItems`; exactly one side is set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub put_request: Option<PutRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[allow(missing_docs)]
    pub delete_request: Option<DeleteRequest>,
}

/// `{Item}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutRequest {
    /// Item to store.
    pub item: Item,
}

/// `{Key}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRequest {
    /// Key to remove.
    pub key: Item,
}
