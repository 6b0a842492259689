//! Table catalog and per-table state.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use localddb_model::error::DynamoDBError;
use localddb_model::input::CreateTableInput;
use localddb_model::types::{
    AttributeDefinition, GlobalSecondaryIndex, GlobalSecondaryIndexDescription, IndexStatus,
    Item, KeySchemaElement, LocalSecondaryIndex, LocalSecondaryIndexDescription,
    ProvisionedThroughput, ProvisionedThroughputDescription, TableDescription, TableStatus,
};

use crate::capacity::item_size;
use crate::clock::epoch_seconds;
use crate::config::DynamoDBConfig;
use crate::storage::{IndexKeys, ItemStore, KeySchema};

/// Message for item operations against a missing or unavailable table.
pub const RESOURCE_NOT_FOUND: &str = "Requested resource not found";

// ---------------------------------------------------------------------------
// Throughput
// ---------------------------------------------------------------------------

/// Provisioned throughput of a table or global index, with change history.
#[derive(Debug, Clone)]
pub struct Throughput {
    units: ProvisionedThroughput,
    last_increase: Option<DateTime<Utc>>,
    last_decrease: Option<DateTime<Utc>>,
    decreases: i64,
    decrease_day: Option<NaiveDate>,
}

impl Throughput {
    #[must_use]
    pub fn new(units: ProvisionedThroughput) -> Self {
        Self {
            units,
            last_increase: None,
            last_decrease: None,
            decreases: 0,
            decrease_day: None,
        }
    }

    /// Currently provisioned units.
    #[must_use]
    pub fn units(&self) -> ProvisionedThroughput {
        self.units
    }

    /// Decreases applied on the given UTC day.
    #[must_use]
    pub fn decreases_on(&self, day: NaiveDate) -> i64 {
        if self.decrease_day == Some(day) {
            self.decreases
        } else {
            0
        }
    }

    /// Record the timestamps of a requested change.
    pub fn stamp(&mut self, requested: ProvisionedThroughput, now: DateTime<Utc>) {
        if is_increase(self.units, requested) {
            self.last_increase = Some(now);
        }
        if is_decrease(self.units, requested) {
            self.last_decrease = Some(now);
        }
    }

    /// Switch to the requested units, counting a decrease against `now`'s day.
    pub fn apply(&mut self, requested: ProvisionedThroughput, now: DateTime<Utc>) {
        if is_decrease(self.units, requested) {
            let today = now.date_naive();
            self.decreases = self.decreases_on(today) + 1;
            self.decrease_day = Some(today);
        }
        self.units = requested;
    }

    #[must_use]
    pub fn describe(&self, today: NaiveDate) -> ProvisionedThroughputDescription {
        ProvisionedThroughputDescription {
            last_increase_date_time: self.last_increase.map(epoch_seconds),
            last_decrease_date_time: self.last_decrease.map(epoch_seconds),
            number_of_decreases_today: self.decreases_on(today),
            read_capacity_units: self.units.read_capacity_units,
            write_capacity_units: self.units.write_capacity_units,
        }
    }
}

/// Whether either unit goes up.
#[must_use]
pub fn is_increase(current: ProvisionedThroughput, requested: ProvisionedThroughput) -> bool {
    requested.read_capacity_units > current.read_capacity_units
        || requested.write_capacity_units > current.write_capacity_units
}

/// Whether either unit goes down.
#[must_use]
pub fn is_decrease(current: ProvisionedThroughput, requested: ProvisionedThroughput) -> bool {
    requested.read_capacity_units < current.read_capacity_units
        || requested.write_capacity_units < current.write_capacity_units
}

// ---------------------------------------------------------------------------
// Indexes
// ---------------------------------------------------------------------------

/// A global secondary index with its own status and throughput.
#[derive(Debug, Clone)]
pub struct GlobalIndex {
    pub definition: GlobalSecondaryIndex,
    pub keys: IndexKeys,
    pub status: IndexStatus,
    pub throughput: Throughput,
}

/// A local secondary index.
#[derive(Debug, Clone)]
pub struct LocalIndex {
    pub definition: LocalSecondaryIndex,
    pub keys: IndexKeys,
}

/// Throughput changes waiting for an update to complete.
#[derive(Debug, Clone, Default)]
pub struct PendingUpdate {
    pub table: Option<ProvisionedThroughput>,
    pub indexes: Vec<(String, ProvisionedThroughput)>,
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Mutable state of one table, guarded by [`Table`]'s lock.
#[derive(Debug)]
pub struct TableState {
    pub status: TableStatus,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema_elements: Vec<KeySchemaElement>,
    pub key_schema: KeySchema,
    pub global_indexes: Vec<GlobalIndex>,
    pub local_indexes: Vec<LocalIndex>,
    pub throughput: Throughput,
    pub pending: Option<PendingUpdate>,
    pub items: ItemStore,
}

impl TableState {
    /// Fail as if the table did not exist unless it is ACTIVE.
    pub fn ensure_active(&self) -> Result<(), DynamoDBError> {
        if self.status == TableStatus::Active {
            Ok(())
        } else {
            Err(DynamoDBError::resource_not_found(RESOURCE_NOT_FOUND))
        }
    }

    /// Key attributes of every secondary index.
    #[must_use]
    pub fn index_keys(&self) -> Vec<IndexKeys> {
        self.local_indexes
            .iter()
            .map(|i| i.keys.clone())
            .chain(self.global_indexes.iter().map(|i| i.keys.clone()))
            .collect()
    }

    /// Look up a global index by name.
    pub fn global_index_mut(&mut self, name: &str) -> Option<&mut GlobalIndex> {
        self.global_indexes
            .iter_mut()
            .find(|i| i.definition.index_name == name)
    }

    /// Apply a pending update and return to ACTIVE.
    pub fn finish_update(&mut self, now: DateTime<Utc>) {
        if let Some(pending) = self.pending.take() {
            if let Some(units) = pending.table {
                self.throughput.apply(units, now);
            }
            for (name, units) in pending.indexes {
                if let Some(index) = self.global_index_mut(&name) {
                    index.throughput.apply(units, now);
                }
            }
        }
        for index in &mut self.global_indexes {
            index.status = IndexStatus::Active;
        }
        self.status = TableStatus::Active;
    }

    /// Mark the table and its indexes ACTIVE after creation.
    pub fn activate(&mut self) {
        for index in &mut self.global_indexes {
            index.status = IndexStatus::Active;
        }
        self.status = TableStatus::Active;
    }

    fn index_totals(&self, keys: &IndexKeys) -> (i64, i64) {
        let (count, size) = self
            .items
            .items()
            .filter(|item| covers(item, &keys.schema))
            .fold((0u64, 0u64), |(count, size), item| {
                (count + 1, size + item_size(item))
            });
        (to_i64(count), to_i64(size))
    }
}

fn covers(item: &Item, schema: &KeySchema) -> bool {
    schema.attributes().all(|attr| item.contains_key(&attr.name))
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// A table: immutable identity plus locked state.
#[derive(Debug)]
pub struct Table {
    pub name: String,
    pub table_id: String,
    pub arn: String,
    pub created_at: DateTime<Utc>,
    state: RwLock<TableState>,
}

impl Table {
    /// Build a CREATING table from a validated request.
    pub fn new(
        input: &CreateTableInput,
        config: &DynamoDBConfig,
        now: DateTime<Utc>,
    ) -> Result<Self, DynamoDBError> {
        let definitions = &input.attribute_definitions;
        let key_schema = resolve(&input.key_schema, definitions)?;
        let arn = format!(
            "arn:aws:dynamodb:{}:{}:table/{}",
            config.region, config.account_id, input.table_name
        );

        let local_indexes = input
            .local_secondary_indexes
            .iter()
            .map(|index| {
                Ok(LocalIndex {
                    keys: IndexKeys {
                        name: index.index_name.clone(),
                        schema: resolve(&index.key_schema, definitions)?,
                    },
                    definition: index.clone(),
                })
            })
            .collect::<Result<Vec<_>, DynamoDBError>>()?;
        let global_indexes = input
            .global_secondary_indexes
            .iter()
            .map(|index| {
                Ok(GlobalIndex {
                    keys: IndexKeys {
                        name: index.index_name.clone(),
                        schema: resolve(&index.key_schema, definitions)?,
                    },
                    status: IndexStatus::Creating,
                    throughput: Throughput::new(index.provisioned_throughput),
                    definition: index.clone(),
                })
            })
            .collect::<Result<Vec<_>, DynamoDBError>>()?;

        Ok(Self {
            name: input.table_name.clone(),
            table_id: uuid::Uuid::new_v4().to_string(),
            arn,
            created_at: now,
            state: RwLock::new(TableState {
                status: TableStatus::Creating,
                attribute_definitions: definitions.clone(),
                key_schema_elements: input.key_schema.clone(),
                key_schema,
                global_indexes,
                local_indexes,
                throughput: Throughput::new(input.provisioned_throughput),
                pending: None,
                items: ItemStore::new(),
            }),
        })
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TableState> {
        self.state.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TableState> {
        self.state.write()
    }

    #[must_use]
    pub fn status(&self) -> TableStatus {
        self.state.read().status
    }

    /// Render the table description as of `now`.
    #[must_use]
    pub fn describe(&self, now: DateTime<Utc>) -> TableDescription {
        self.describe_state(&self.state.read(), now)
    }

    /// Render a description from state the caller already holds.
    #[must_use]
    pub fn describe_state(&self, state: &TableState, now: DateTime<Utc>) -> TableDescription {
        let today = now.date_naive();
        let global_secondary_indexes = state
            .global_indexes
            .iter()
            .map(|index| {
                let (item_count, index_size_bytes) = state.index_totals(&index.keys);
                GlobalSecondaryIndexDescription {
                    index_name: index.definition.index_name.clone(),
                    index_arn: self.index_arn(&index.definition.index_name),
                    index_size_bytes,
                    index_status: index.status,
                    item_count,
                    key_schema: index.definition.key_schema.clone(),
                    projection: index.definition.projection.clone(),
                    provisioned_throughput: index.throughput.describe(today),
                }
            })
            .collect();
        let local_secondary_indexes = state
            .local_indexes
            .iter()
            .map(|index| {
                let (item_count, index_size_bytes) = state.index_totals(&index.keys);
                LocalSecondaryIndexDescription {
                    index_name: index.definition.index_name.clone(),
                    index_arn: self.index_arn(&index.definition.index_name),
                    index_size_bytes,
                    item_count,
                    key_schema: index.definition.key_schema.clone(),
                    projection: index.definition.projection.clone(),
                }
            })
            .collect();

        TableDescription {
            attribute_definitions: state.attribute_definitions.clone(),
            creation_date_time: epoch_seconds(self.created_at),
            global_secondary_indexes,
            item_count: to_i64(state.items.item_count()),
            key_schema: state.key_schema_elements.clone(),
            local_secondary_indexes,
            provisioned_throughput: state.throughput.describe(today),
            table_arn: self.arn.clone(),
            table_id: self.table_id.clone(),
            table_name: self.name.clone(),
            table_size_bytes: to_i64(state.items.size_bytes()),
            table_status: state.status,
        }
    }

    fn index_arn(&self, index_name: &str) -> String {
        format!("{}/index/{index_name}", self.arn)
    }
}

fn resolve(
    elements: &[KeySchemaElement],
    definitions: &[AttributeDefinition],
) -> Result<KeySchema, DynamoDBError> {
    KeySchema::resolve(elements, definitions).ok_or_else(|| {
        DynamoDBError::validation(
            "One or more parameter values were invalid: \
             Some index key attributes are not defined in AttributeDefinitions",
        )
    })
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// All tables, keyed by name.
#[derive(Debug, Default)]
pub struct TableCatalog {
    tables: DashMap<String, Arc<Table>>,
    lifecycle: Mutex<()>,
}

impl TableCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize lifecycle decisions that count tables before changing them.
    pub fn lifecycle_lock(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Get a table or return `ResourceNotFoundException` naming it.
    pub fn require(&self, name: &str) -> Result<Arc<Table>, DynamoDBError> {
        self.get(name).ok_or_else(|| {
            DynamoDBError::resource_not_found(format!(
                "{RESOURCE_NOT_FOUND}: Table: {name} not found"
            ))
        })
    }

    /// Get a table for an item operation.
    pub fn require_for_items(&self, name: &str) -> Result<Arc<Table>, DynamoDBError> {
        self.get(name)
            .ok_or_else(|| DynamoDBError::resource_not_found(RESOURCE_NOT_FOUND))
    }

    /// Insert a new table. Fails if the name is taken.
    pub fn insert(&self, table: Table) -> Result<Arc<Table>, DynamoDBError> {
        match self.tables.entry(table.name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(e) => Err(DynamoDBError::resource_in_use(
                format!("Table already exists: {}", e.key()),
            )),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let table = Arc::new(table);
                e.insert(Arc::clone(&table));
                Ok(table)
            }
        }
    }

    /// Remove a table, but only the incarnation with `table_id`.
    pub fn remove(&self, name: &str, table_id: &str) -> bool {
        self.tables
            .remove_if(name, |_, table| table.table_id == table_id)
            .is_some()
    }

    /// Table names in lexical order.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of tables CREATING, UPDATING or DELETING.
    #[must_use]
    pub fn transitional_count(&self) -> usize {
        let tables: Vec<Arc<Table>> = self.tables.iter().map(|r| Arc::clone(r.value())).collect();
        tables
            .iter()
            .filter(|t| t.status().is_transitional())
            .count()
    }

    /// Remove every table.
    pub fn clear(&self) {
        self.tables.clear();
    }
}
