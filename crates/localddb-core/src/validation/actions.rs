//! Request shapes and action-specific checks for every supported operation.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde_json::{Map, Value};

use localddb_model::error::DynamoDBError;
use localddb_model::input::{CreateTableInput, UpdateTableInput};
use localddb_model::operations::DynamoDBOperation;
use localddb_model::types::{
    Item, KeySchemaElement, KeyType, Projection, ProjectionType, ProvisionedThroughput,
};

use super::decode;
use super::shape::{Member, NAME_PATTERN, Shape};
use crate::capacity::item_size;
use crate::codec::{self, MULTIPLE_TYPES};
use crate::config::DynamoDBConfig;

/// Keys a single `BatchGetItem` call may request across all tables.
pub const MAX_BATCH_GET_KEYS: usize = 100;
/// Requests a single `BatchWriteItem` call may carry across all tables.
pub const MAX_BATCH_WRITE_REQUESTS: usize = 25;
/// Largest accepted read or write capacity unit value.
pub const MAX_CAPACITY_UNITS: i64 = 1_000_000_000_000;
/// Secondary indexes of each kind a table may have.
pub const MAX_INDEXES: usize = 5;

const RETURN_CONSUMED_CAPACITY: &[&str] = &["INDEXES", "TOTAL", "NONE"];
const RETURN_ITEM_COLLECTION_METRICS: &[&str] = &["SIZE", "NONE"];
const RETURN_VALUES: &[&str] = &["ALL_NEW", "UPDATED_OLD", "ALL_OLD", "NONE", "UPDATED_NEW"];
const KEY_TYPES: &[&str] = &["HASH", "RANGE"];
const ATTRIBUTE_TYPES: &[&str] = &["B", "N", "S"];
const PROJECTION_TYPES: &[&str] = &["ALL", "INCLUDE", "KEYS_ONLY"];

// ---------------------------------------------------------------------------
// Shared shapes
// ---------------------------------------------------------------------------

fn throughput() -> Shape {
    Shape::structure(vec![
        Member::new("WriteCapacityUnits", Shape::long().not_null().min(1)),
        Member::new("ReadCapacityUnits", Shape::long().not_null().min(1)),
    ])
    .not_null()
}

fn key_schema() -> Shape {
    Shape::list(Shape::structure(vec![
        Member::new(
            "AttributeName",
            Shape::string().not_null().min_len(1).max_len(255),
        ),
        Member::new("KeyType", Shape::string().not_null().one_of(KEY_TYPES)),
    ]))
    .not_null()
    .min_len(1)
    .max_len(2)
}

fn index_name() -> Shape {
    Shape::string()
        .not_null()
        .min_len(3)
        .max_len(255)
        .pattern(&NAME_PATTERN)
}

fn projection() -> Shape {
    Shape::structure(vec![
        Member::new("ProjectionType", Shape::string().one_of(PROJECTION_TYPES)),
        Member::new(
            "NonKeyAttributes",
            Shape::list(Shape::string()).min_len(1).max_len(20),
        ),
    ])
    .not_null()
}

fn attributes_to_get() -> Member {
    Member::new(
        "AttributesToGet",
        Shape::list(Shape::string()).min_len(1).max_len(255),
    )
}

fn return_consumed_capacity() -> Member {
    Member::new(
        "ReturnConsumedCapacity",
        Shape::string().one_of(RETURN_CONSUMED_CAPACITY),
    )
}

fn return_item_collection_metrics() -> Member {
    Member::new(
        "ReturnItemCollectionMetrics",
        Shape::string().one_of(RETURN_ITEM_COLLECTION_METRICS),
    )
}

fn return_values() -> Member {
    Member::new("ReturnValues", Shape::string().one_of(RETURN_VALUES))
}

// ---------------------------------------------------------------------------
// Per-operation shapes
// ---------------------------------------------------------------------------

static CREATE_TABLE: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        Member::new(
            "AttributeDefinitions",
            Shape::list(Shape::structure(vec![
                Member::new(
                    "AttributeName",
                    Shape::string().not_null().min_len(1).max_len(255),
                ),
                Member::new(
                    "AttributeType",
                    Shape::string().not_null().one_of(ATTRIBUTE_TYPES),
                ),
            ]))
            .not_null(),
        ),
        Member::table_name("TableName"),
        Member::new("KeySchema", key_schema()),
        Member::new(
            "LocalSecondaryIndexes",
            Shape::list(Shape::structure(vec![
                Member::new("IndexName", index_name()),
                Member::new("KeySchema", key_schema()),
                Member::new("Projection", projection()),
            ])),
        ),
        Member::new(
            "GlobalSecondaryIndexes",
            Shape::list(Shape::structure(vec![
                Member::new("IndexName", index_name()),
                Member::new("KeySchema", key_schema()),
                Member::new("Projection", projection()),
                Member::new("ProvisionedThroughput", throughput()),
            ])),
        ),
        Member::new("ProvisionedThroughput", throughput()),
    ]
});

static TABLE_NAME_ONLY: LazyLock<Vec<Member>> =
    LazyLock::new(|| vec![Member::table_name("TableName")]);

static LIST_TABLES: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        Member::new(
            "ExclusiveStartTableName",
            Shape::string()
                .min_len(3)
                .max_len(255)
                .pattern(&NAME_PATTERN),
        ),
        Member::new("Limit", Shape::integer().min(1).max(100)),
    ]
});

static UPDATE_TABLE: LazyLock<Vec<Member>> = LazyLock::new(|| {
    // Optional at the top level; its members are still checked when present.
    let mut table_throughput = throughput();
    table_throughput.constraints.clear();
    vec![
        Member::table_name("TableName"),
        Member::new("ProvisionedThroughput", table_throughput),
        Member::new(
            "GlobalSecondaryIndexUpdates",
            Shape::list(Shape::structure(vec![Member::new(
                "Update",
                Shape::structure(vec![
                    Member::new("IndexName", index_name()),
                    Member::new("ProvisionedThroughput", throughput()),
                ]),
            )])),
        ),
    ]
});

static PUT_ITEM: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        return_consumed_capacity(),
        return_item_collection_metrics(),
        return_values(),
        Member::table_name("TableName"),
        Member::new("Item", Shape::attribute_map().not_null()),
    ]
});

static GET_ITEM: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        attributes_to_get(),
        Member::new("ConsistentRead", Shape::boolean()),
        return_consumed_capacity(),
        Member::table_name("TableName"),
        Member::new("Key", Shape::attribute_map().not_null()),
    ]
});

static DELETE_ITEM: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        return_consumed_capacity(),
        return_item_collection_metrics(),
        return_values(),
        Member::table_name("TableName"),
        Member::new("Key", Shape::attribute_map().not_null()),
    ]
});

static BATCH_GET_ITEM: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        return_consumed_capacity(),
        Member::new(
            "RequestItems",
            Shape::map(Shape::structure(vec![
                Member::new(
                    "Keys",
                    Shape::list(Shape::attribute_map())
                        .not_null()
                        .min_len(1)
                        .max_len(MAX_BATCH_GET_KEYS),
                ),
                attributes_to_get(),
                Member::new("ConsistentRead", Shape::boolean()),
            ]))
            .not_null()
            .min_len(1),
        ),
    ]
});

static BATCH_WRITE_ITEM: LazyLock<Vec<Member>> = LazyLock::new(|| {
    vec![
        return_consumed_capacity(),
        return_item_collection_metrics(),
        Member::new(
            "RequestItems",
            Shape::map(
                Shape::list(Shape::structure(vec![
                    Member::new(
                        "DeleteRequest",
                        Shape::structure(vec![Member::new(
                            "Key",
                            Shape::attribute_map().not_null(),
                        )]),
                    ),
                    Member::new(
                        "PutRequest",
                        Shape::structure(vec![Member::new(
                            "Item",
                            Shape::attribute_map().not_null(),
                        )]),
                    ),
                ]))
                .min_len(1)
                .max_len(MAX_BATCH_WRITE_REQUESTS),
            )
            .not_null()
            .min_len(1),
        ),
    ]
});

/// Top-level members of an operation's request.
#[must_use]
pub fn members(op: DynamoDBOperation) -> &'static [Member] {
    match op {
        DynamoDBOperation::CreateTable => &CREATE_TABLE,
        DynamoDBOperation::DeleteTable | DynamoDBOperation::DescribeTable => &TABLE_NAME_ONLY,
        DynamoDBOperation::ListTables => &LIST_TABLES,
        DynamoDBOperation::UpdateTable => &UPDATE_TABLE,
        DynamoDBOperation::PutItem => &PUT_ITEM,
        DynamoDBOperation::GetItem => &GET_ITEM,
        DynamoDBOperation::DeleteItem => &DELETE_ITEM,
        DynamoDBOperation::BatchGetItem => &BATCH_GET_ITEM,
        DynamoDBOperation::BatchWriteItem => &BATCH_WRITE_ITEM,
    }
}

// ---------------------------------------------------------------------------
// Action-specific checks
// ---------------------------------------------------------------------------

/// Run the checks that follow the aggregate pass, normalizing attribute
/// values in place.
pub fn check_action(
    op: DynamoDBOperation,
    body: &mut Map<String, Value>,
    config: &DynamoDBConfig,
) -> Result<(), DynamoDBError> {
    match op {
        DynamoDBOperation::CreateTable => check_create_table(&decode(body.clone())?),
        DynamoDBOperation::UpdateTable => check_update_table(&decode(body.clone())?),
        DynamoDBOperation::PutItem => check_put_item(body, config),
        DynamoDBOperation::GetItem => check_get_item(body),
        DynamoDBOperation::DeleteItem => check_delete_item(body),
        DynamoDBOperation::BatchGetItem => check_batch_get_item(body),
        DynamoDBOperation::BatchWriteItem => check_batch_write_item(body, config),
        DynamoDBOperation::DeleteTable
        | DynamoDBOperation::DescribeTable
        | DynamoDBOperation::ListTables => Ok(()),
    }
}

fn invalid(detail: impl std::fmt::Display) -> DynamoDBError {
    DynamoDBError::validation(format!(
        "One or more parameter values were invalid: {detail}"
    ))
}

fn object_mut<'a>(
    body: &'a mut Map<String, Value>,
    field: &str,
) -> Option<&'a mut Map<String, Value>> {
    body.get_mut(field).and_then(Value::as_object_mut)
}

fn check_return_values(body: &Map<String, Value>) -> Result<(), DynamoDBError> {
    match body.get("ReturnValues").and_then(Value::as_str) {
        Some("ALL_OLD" | "NONE") | None => Ok(()),
        Some(_) => Err(DynamoDBError::validation(
            "ReturnValues can only be ALL_OLD or NONE",
        )),
    }
}

fn check_item_size(
    item: &Map<String, Value>,
    config: &DynamoDBConfig,
) -> Result<(), DynamoDBError> {
    let item: Item = decode(item.clone())?;
    if item_size(&item) > config.max_item_size {
        return Err(DynamoDBError::validation(
            "Item size has exceeded the maximum allowed size",
        ));
    }
    Ok(())
}

fn check_attribute_names(names: Option<&Value>) -> Result<(), DynamoDBError> {
    let mut seen = HashSet::new();
    for name in names.and_then(Value::as_array).into_iter().flatten() {
        let name = name.as_str().unwrap_or_default();
        if !seen.insert(name) {
            return Err(invalid(format_args!(
                "Duplicate value in attribute name: {name}"
            )));
        }
    }
    Ok(())
}

/// Key text that ignores attribute order, for duplicate detection.
fn canonical_key(key: &Value) -> String {
    let mut entries: Vec<(&String, &Value)> = key.as_object().into_iter().flatten().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let sorted: Map<String, Value> = entries
        .into_iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Value::Object(sorted).to_string()
}

fn check_put_item(
    body: &mut Map<String, Value>,
    config: &DynamoDBConfig,
) -> Result<(), DynamoDBError> {
    if let Some(item) = object_mut(body, "Item") {
        codec::validate_attribute_map(item)?;
    }
    check_return_values(body)?;
    if let Some(item) = body.get("Item").and_then(Value::as_object) {
        check_item_size(item, config)?;
    }
    Ok(())
}

fn check_get_item(body: &mut Map<String, Value>) -> Result<(), DynamoDBError> {
    if let Some(key) = object_mut(body, "Key") {
        codec::validate_attribute_map(key)?;
    }
    check_attribute_names(body.get("AttributesToGet"))
}

fn check_delete_item(body: &mut Map<String, Value>) -> Result<(), DynamoDBError> {
    if let Some(key) = object_mut(body, "Key") {
        codec::validate_attribute_map(key)?;
    }
    check_return_values(body)
}

fn check_batch_get_item(body: &mut Map<String, Value>) -> Result<(), DynamoDBError> {
    let Some(request_items) = object_mut(body, "RequestItems") else {
        return Ok(());
    };
    let mut total = 0;
    for table_request in request_items.values_mut() {
        let Some(table_request) = table_request.as_object_mut() else {
            continue;
        };
        if let Some(keys) = table_request.get_mut("Keys").and_then(Value::as_array_mut) {
            for key in keys.iter_mut().filter_map(Value::as_object_mut) {
                codec::validate_attribute_map(key)?;
            }
            let mut seen = HashSet::with_capacity(keys.len());
            if !keys.iter().all(|k| seen.insert(canonical_key(k))) {
                return Err(DynamoDBError::validation(
                    "Provided list of item keys contains duplicates",
                ));
            }
            total += keys.len();
            if total > MAX_BATCH_GET_KEYS {
                return Err(DynamoDBError::validation(
                    "Too many items requested for the BatchGetItem call",
                ));
            }
        }
        check_attribute_names(table_request.get("AttributesToGet"))?;
    }
    Ok(())
}

fn check_batch_write_item(
    body: &mut Map<String, Value>,
    config: &DynamoDBConfig,
) -> Result<(), DynamoDBError> {
    let Some(request_items) = object_mut(body, "RequestItems") else {
        return Ok(());
    };
    let mut total = 0;
    for requests in request_items.values_mut() {
        let Some(requests) = requests.as_array_mut() else {
            continue;
        };
        for request in requests.iter_mut().filter_map(Value::as_object_mut) {
            if request.contains_key("PutRequest") == request.contains_key("DeleteRequest") {
                return Err(DynamoDBError::validation(MULTIPLE_TYPES));
            }
            if let Some(item) = request
                .get_mut("PutRequest")
                .and_then(|put| put.get_mut("Item"))
                .and_then(Value::as_object_mut)
            {
                codec::validate_attribute_map(item)?;
                check_item_size(item, config)?;
            }
            if let Some(key) = request
                .get_mut("DeleteRequest")
                .and_then(|delete| delete.get_mut("Key"))
                .and_then(Value::as_object_mut)
            {
                codec::validate_attribute_map(key)?;
            }
        }
        total += requests.len();
        if total > MAX_BATCH_WRITE_REQUESTS {
            return Err(DynamoDBError::validation(
                "Too many items requested for the BatchWriteItem call",
            ));
        }
    }
    Ok(())
}

fn check_throughput_bounds(
    throughput: &ProvisionedThroughput,
    index: Option<&str>,
) -> Result<(), DynamoDBError> {
    let suffix = index.map(|name| format!(" for index {name}")).unwrap_or_default();
    for (units, label) in [
        (throughput.read_capacity_units, "ReadCapacityUnits"),
        (throughput.write_capacity_units, "WriteCapacityUnits"),
    ] {
        if units > MAX_CAPACITY_UNITS {
            return Err(DynamoDBError::validation(format!(
                "Given value {units} for {label} is out of bounds{suffix}"
            )));
        }
    }
    Ok(())
}

fn check_key_schema_layout(schema: &[KeySchemaElement]) -> Result<(), DynamoDBError> {
    if schema.first().is_some_and(|e| e.key_type != KeyType::Hash) {
        return Err(DynamoDBError::validation(
            "Invalid KeySchema: The first KeySchemaElement is not a HASH key type",
        ));
    }
    if let Some(second) = schema.get(1) {
        if second.key_type != KeyType::Range {
            return Err(DynamoDBError::validation(
                "Invalid KeySchema: The second KeySchemaElement is not a RANGE key type",
            ));
        }
        if schema[0].attribute_name == second.attribute_name {
            return Err(DynamoDBError::validation(
                "Both the Hash Key and the Range Key element in the KeySchema have the same name",
            ));
        }
    }
    Ok(())
}

fn check_keys_defined(schema: &[KeySchemaElement], defined: &[&str]) -> Result<(), DynamoDBError> {
    if schema
        .iter()
        .all(|e| defined.contains(&e.attribute_name.as_str()))
    {
        return Ok(());
    }
    let keys: Vec<&str> = schema.iter().map(|e| e.attribute_name.as_str()).collect();
    Err(invalid(format_args!(
        "Some index key attributes are not defined in AttributeDefinitions. \
         Keys: [{}], AttributeDefinitions: [{}]",
        keys.join(", "),
        defined.join(", ")
    )))
}

fn check_projection(projection: &Projection) -> Result<(), DynamoDBError> {
    match projection.projection_type {
        Some(ProjectionType::Include) if projection.non_key_attributes.is_empty() => Err(invalid(
            "ProjectionType is INCLUDE, but NonKeyAttributes is not specified",
        )),
        Some(ty) if ty != ProjectionType::Include && !projection.non_key_attributes.is_empty() => {
            let name = match ty {
                ProjectionType::All => "ALL",
                ProjectionType::KeysOnly => "KEYS_ONLY",
                ProjectionType::Include => "INCLUDE",
            };
            Err(invalid(format_args!(
                "ProjectionType is {name}, but NonKeyAttributes is specified"
            )))
        }
        _ => Ok(()),
    }
}

fn check_create_table(input: &CreateTableInput) -> Result<(), DynamoDBError> {
    check_throughput_bounds(&input.provisioned_throughput, None)?;

    let mut defined: Vec<&str> = Vec::new();
    for def in &input.attribute_definitions {
        if !defined.contains(&def.attribute_name.as_str()) {
            defined.push(&def.attribute_name);
        }
    }

    check_key_schema_layout(&input.key_schema)?;
    check_keys_defined(&input.key_schema, &defined)?;

    let mut used: HashSet<&str> = input
        .key_schema
        .iter()
        .map(|e| e.attribute_name.as_str())
        .collect();
    let mut index_names: HashSet<&str> = HashSet::new();

    if !input.local_secondary_indexes.is_empty() {
        if input.key_schema.len() < 2 {
            return Err(invalid(
                "Table KeySchema does not have a range key, \
                 which is required when specifying a LocalSecondaryIndex",
            ));
        }
        if input.local_secondary_indexes.len() > MAX_INDEXES {
            return Err(invalid(
                "Number of LocalSecondaryIndexes exceeds per-table limit of 5",
            ));
        }
        let table_hash = &input.key_schema[0].attribute_name;
        for lsi in &input.local_secondary_indexes {
            check_key_schema_layout(&lsi.key_schema)?;
            check_keys_defined(&lsi.key_schema, &defined)?;
            let index_hash = lsi
                .key_schema
                .first()
                .map_or("", |e| e.attribute_name.as_str());
            if index_hash != table_hash {
                return Err(invalid(format_args!(
                    "Index KeySchema does not have the same leading hash key as table KeySchema \
                     for index: {}. index hash key: {index_hash}, table hash key: {table_hash}",
                    lsi.index_name
                )));
            }
            if lsi.key_schema.len() < 2 {
                return Err(invalid(format_args!(
                    "Index KeySchema does not have a range key for index: {}",
                    lsi.index_name
                )));
            }
            if !index_names.insert(&lsi.index_name) {
                return Err(invalid(format_args!(
                    "Duplicate index name: {}",
                    lsi.index_name
                )));
            }
            check_projection(&lsi.projection)?;
            used.extend(lsi.key_schema.iter().map(|e| e.attribute_name.as_str()));
        }
    }

    if !input.global_secondary_indexes.is_empty() {
        if input.global_secondary_indexes.len() > MAX_INDEXES {
            return Err(invalid(
                "GlobalSecondaryIndex count exceeds the per-table limit of 5",
            ));
        }
        for gsi in &input.global_secondary_indexes {
            check_key_schema_layout(&gsi.key_schema)?;
            check_keys_defined(&gsi.key_schema, &defined)?;
            if !index_names.insert(&gsi.index_name) {
                return Err(invalid(format_args!(
                    "Duplicate index name: {}",
                    gsi.index_name
                )));
            }
            check_projection(&gsi.projection)?;
            check_throughput_bounds(&gsi.provisioned_throughput, Some(&gsi.index_name))?;
            used.extend(gsi.key_schema.iter().map(|e| e.attribute_name.as_str()));
        }
    }

    if used.len() != defined.len() {
        return Err(invalid(
            "Number of attributes in KeySchema does not exactly match \
             number of attributes defined in AttributeDefinitions",
        ));
    }
    Ok(())
}

fn check_update_table(input: &UpdateTableInput) -> Result<(), DynamoDBError> {
    let index_updates: Vec<_> = input
        .global_secondary_index_updates
        .iter()
        .filter_map(|u| u.update.as_ref())
        .collect();
    // Entries without `Update` change nothing.
    if input.provisioned_throughput.is_none() && index_updates.is_empty() {
        return Err(DynamoDBError::validation(
            "At least one of ProvisionedThroughput or GlobalSecondaryIndexUpdates is required",
        ));
    }
    if let Some(throughput) = &input.provisioned_throughput {
        check_throughput_bounds(throughput, None)?;
    }
    for update in index_updates {
        check_throughput_bounds(&update.provisioned_throughput, Some(&update.index_name))?;
    }
    Ok(())
}
