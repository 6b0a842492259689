//! DynamoDB provider implementing every supported operation.
//!
//! Inputs reaching the `handle_*` methods have already passed request
//! validation; the provider applies the checks that depend on catalog state
//! and performs the operation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use localddb_model::error::DynamoDBError;
use localddb_model::input::{
    BatchGetItemInput, BatchWriteItemInput, CreateTableInput, DeleteItemInput, DeleteTableInput,
    DescribeTableInput, GetItemInput, ListTablesInput, PutItemInput, UpdateTableInput,
};
use localddb_model::output::{
    BatchGetItemOutput, BatchWriteItemOutput, CreateTableOutput, DeleteItemOutput,
    DeleteTableOutput, DescribeTableOutput, GetItemOutput, ListTablesOutput, PutItemOutput,
    UpdateTableOutput,
};
use localddb_model::types::{IndexStatus, Item, ProvisionedThroughput, ReturnValue, TableStatus};

use crate::batch::{batch_get, batch_write};
use crate::capacity::{consumed_capacity, item_size, read_units, write_units};
use crate::clock::{Clock, SystemClock};
use crate::config::DynamoDBConfig;
use crate::error::storage_error_to_dynamodb;
use crate::lifecycle::{LifecycleScheduler, ScheduledTransition, Transition, apply_transition};
use crate::state::{PendingUpdate, Table, TableCatalog, Throughput, is_decrease};
use crate::storage::{extract_item_key, extract_key, project};
use crate::validation::actions::MAX_INDEXES;

/// Throughput decreases allowed per table (or index) per UTC day.
pub const MAX_DECREASES_PER_DAY: i64 = 4;

/// Default page size for `ListTables`.
const DEFAULT_LIST_LIMIT: i64 = 100;

/// In-process DynamoDB emulator.
#[derive(Debug)]
pub struct LocalDynamoDB {
    config: Arc<DynamoDBConfig>,
    clock: Arc<dyn Clock>,
    catalog: TableCatalog,
    scheduler: LifecycleScheduler,
}

impl LocalDynamoDB {
    /// Create a provider running on wall-clock time.
    #[must_use]
    pub fn new(config: DynamoDBConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a provider reading time from `clock`.
    #[must_use]
    pub fn with_clock(config: DynamoDBConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            clock,
            catalog: TableCatalog::new(),
            scheduler: LifecycleScheduler::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DynamoDBConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &TableCatalog {
        &self.catalog
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Apply every lifecycle transition that is due.
    pub fn tick(&self) {
        let now = self.now();
        let due = self.scheduler.take_due(now);
        if due.is_empty() {
            return;
        }
        let _guard = self.catalog.lifecycle_lock();
        for scheduled in &due {
            apply_transition(&self.catalog, scheduled, now);
        }
    }

    /// Current status of a table, without applying due transitions.
    #[must_use]
    pub fn table_status(&self, name: &str) -> Option<TableStatus> {
        self.catalog.get(name).map(|t| t.status())
    }

    /// Drop every table and pending transition.
    pub fn reset(&self) {
        let _guard = self.catalog.lifecycle_lock();
        self.scheduler.clear();
        self.catalog.clear();
    }

    fn schedule(&self, table: &Table, delay: Duration, transition: Transition) {
        let delay = chrono::Duration::from_std(delay).unwrap_or(chrono::Duration::MAX);
        let due = self
            .now()
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.scheduler.schedule(ScheduledTransition {
            table_name: table.name.clone(),
            table_id: table.table_id.clone(),
            due,
            transition,
        });
    }

    fn check_concurrent_lifecycle(&self) -> Result<(), DynamoDBError> {
        let limit = self.config.max_concurrent_lifecycle;
        if self.catalog.transitional_count() >= limit {
            warn!(limit, "concurrent lifecycle limit reached");
            return Err(DynamoDBError::limit_exceeded(format!(
                "Subscriber limit exceeded: Only {limit} tables can be created, updated, \
                 or deleted simultaneously"
            )));
        }
        Ok(())
    }
}

fn in_use(status: TableStatus, name: &str) -> Result<(), DynamoDBError> {
    let verb = match status {
        TableStatus::Active => return Ok(()),
        TableStatus::Creating => "created",
        TableStatus::Updating => "updated",
        TableStatus::Deleting => "deleted",
    };
    Err(DynamoDBError::resource_in_use(format!(
        "Attempt to change a resource which is still in use: Table is being {verb}: {name}"
    )))
}

fn unchanged_message(
    subject: &str,
    current: ProvisionedThroughput,
    requested: ProvisionedThroughput,
) -> String {
    format!(
        "The provisioned throughput for the {subject} will not change. The requested value \
         equals the current value. Current ReadCapacityUnits provisioned for the {kind}: {}. \
         Requested ReadCapacityUnits: {}. Current WriteCapacityUnits provisioned for the \
         {kind}: {}. Requested WriteCapacityUnits: {}. Refer to the Amazon DynamoDB Developer \
         Guide for current limits and how to request higher limits.",
        current.read_capacity_units,
        requested.read_capacity_units,
        current.write_capacity_units,
        requested.write_capacity_units,
        kind = subject.split(' ').next().unwrap_or(subject),
    )
}

fn check_throughput_change(
    subject: &str,
    throughput: &Throughput,
    requested: ProvisionedThroughput,
    now: DateTime<Utc>,
) -> Result<(), DynamoDBError> {
    let current = throughput.units();
    if current == requested {
        return Err(DynamoDBError::validation(unchanged_message(
            subject, current, requested,
        )));
    }
    let decreases = throughput.decreases_on(now.date_naive());
    if is_decrease(current, requested) && decreases >= MAX_DECREASES_PER_DAY {
        warn!(subject, decreases, "throughput decrease limit reached");
        return Err(DynamoDBError::limit_exceeded(format!(
            "Subscriber limit exceeded: Provisioned throughput decreases are limited within \
             a given UTC day. Number of decreases today: {decreases}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Table management
// ---------------------------------------------------------------------------

impl LocalDynamoDB {
    /// Handle `CreateTable`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn handle_create_table(
        &self,
        input: CreateTableInput,
    ) -> Result<CreateTableOutput, DynamoDBError> {
        let now = self.now();
        let _guard = self.catalog.lifecycle_lock();

        if self.catalog.get(&input.table_name).is_some() {
            return Err(DynamoDBError::resource_in_use(format!(
                "Table already exists: {}",
                input.table_name
            )));
        }
        let max_tables = self.config.max_tables;
        if self.catalog.len() >= max_tables {
            warn!(max_tables, "table limit reached");
            return Err(DynamoDBError::limit_exceeded(format!(
                "Subscriber limit exceeded: Tables are limited to {max_tables} per account"
            )));
        }
        self.check_concurrent_lifecycle()?;

        let table = self.catalog.insert(Table::new(&input, &self.config, now)?)?;
        self.schedule(&table, self.config.create_table_delay, Transition::Activate);
        info!(table = %table.name, table_id = %table.table_id, "creating table");

        Ok(CreateTableOutput {
            table_description: table.describe(now),
        })
    }

    /// Handle `DeleteTable`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn handle_delete_table(
        &self,
        input: DeleteTableInput,
    ) -> Result<DeleteTableOutput, DynamoDBError> {
        let now = self.now();
        let _guard = self.catalog.lifecycle_lock();

        let table = self.catalog.require(&input.table_name)?;
        in_use(table.status(), &table.name)?;
        self.check_concurrent_lifecycle()?;

        let table_description = {
            let mut state = table.write();
            state.status = TableStatus::Deleting;
            for index in &mut state.global_indexes {
                index.status = IndexStatus::Deleting;
            }
            table.describe_state(&state, now)
        };
        self.scheduler.cancel(&table.name);
        self.schedule(&table, self.config.delete_table_delay, Transition::Remove);
        info!(table = %table.name, "deleting table");

        Ok(DeleteTableOutput { table_description })
    }

    /// Handle `DescribeTable`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn handle_describe_table(
        &self,
        input: DescribeTableInput,
    ) -> Result<DescribeTableOutput, DynamoDBError> {
        let table = self.catalog.require(&input.table_name)?;
        Ok(DescribeTableOutput {
            table: table.describe(self.now()),
        })
    }

    /// Handle `ListTables`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn handle_list_tables(
        &self,
        input: ListTablesInput,
    ) -> Result<ListTablesOutput, DynamoDBError> {
        let all_names = self.catalog.table_names();
        let limit = usize::try_from(input.limit.unwrap_or(DEFAULT_LIST_LIMIT).max(1))
            .unwrap_or(usize::MAX);

        let start_idx = input
            .exclusive_start_table_name
            .as_deref()
            .map_or(0, |start| {
                all_names
                    .iter()
                    .position(|n| n.as_str() > start)
                    .unwrap_or(all_names.len())
            });

        let mut table_names: Vec<String> = all_names.into_iter().skip(start_idx).collect();
        let last_evaluated_table_name = if table_names.len() > limit {
            table_names.truncate(limit);
            table_names.last().cloned()
        } else {
            None
        };

        Ok(ListTablesOutput {
            table_names,
            last_evaluated_table_name,
        })
    }

    /// Handle `UpdateTable`.
    #[allow(clippy::needless_pass_by_value)]
    pub fn handle_update_table(
        &self,
        input: UpdateTableInput,
    ) -> Result<UpdateTableOutput, DynamoDBError> {
        let now = self.now();
        let _guard = self.catalog.lifecycle_lock();

        let table = self.catalog.require(&input.table_name)?;
        in_use(table.status(), &table.name)?;

        let index_updates: Vec<_> = input
            .global_secondary_index_updates
            .iter()
            .filter_map(|u| u.update.as_ref())
            .collect();
        if index_updates.len() > MAX_INDEXES {
            warn!(table = %table.name, count = index_updates.len(), "too many index updates");
            return Err(DynamoDBError::limit_exceeded(format!(
                "Subscriber limit exceeded: Only {MAX_INDEXES} GlobalSecondaryIndexUpdates \
                 are allowed per request"
            )));
        }

        {
            let state = table.read();
            for update in &index_updates {
                let index = state
                    .global_indexes
                    .iter()
                    .find(|i| i.definition.index_name == update.index_name)
                    .ok_or_else(|| {
                        DynamoDBError::resource_not_found(format!(
                            "Requested resource not found: Index: {} not found",
                            update.index_name
                        ))
                    })?;
                check_throughput_change(
                    &format!("index {}", update.index_name),
                    &index.throughput,
                    update.provisioned_throughput,
                    now,
                )?;
            }
            if let Some(requested) = input.provisioned_throughput {
                check_throughput_change("table", &state.throughput, requested, now)?;
            }
        }
        self.check_concurrent_lifecycle()?;

        let table_description = {
            let mut state = table.write();
            let mut pending = PendingUpdate::default();
            if let Some(requested) = input.provisioned_throughput {
                state.throughput.stamp(requested, now);
                pending.table = Some(requested);
            }
            for update in &index_updates {
                if let Some(index) = state.global_index_mut(&update.index_name) {
                    index.throughput.stamp(update.provisioned_throughput, now);
                    index.status = IndexStatus::Updating;
                    pending
                        .indexes
                        .push((update.index_name.clone(), update.provisioned_throughput));
                }
            }
            state.pending = Some(pending);
            state.status = TableStatus::Updating;
            table.describe_state(&state, now)
        };
        self.schedule(&table, self.config.update_table_delay, Transition::FinishUpdate);
        info!(table = %table.name, "updating table");

        Ok(UpdateTableOutput { table_description })
    }
}

// ---------------------------------------------------------------------------
// Item CRUD
// ---------------------------------------------------------------------------

fn returned(old: Option<Item>, mode: Option<ReturnValue>) -> Option<Item> {
    old.filter(|_| mode == Some(ReturnValue::AllOld))
}

impl LocalDynamoDB {
    /// Handle `PutItem`.
    pub fn handle_put_item(&self, input: PutItemInput) -> Result<PutItemOutput, DynamoDBError> {
        let table = self.catalog.require_for_items(&input.table_name)?;
        let mut state = table.write();
        state.ensure_active()?;

        let key = extract_item_key(&state.key_schema, &state.index_keys(), &input.item)
            .map_err(storage_error_to_dynamodb)?;
        let new_size = item_size(&input.item);
        let old = state.items.put(key, input.item);
        let old_size = old.as_ref().map_or(0, item_size);
        let units = write_units(new_size.max(old_size));
        debug!(table = %table.name, new_size, replaced = old.is_some(), "put item");

        Ok(PutItemOutput {
            attributes: returned(old, input.return_values),
            consumed_capacity: consumed_capacity(
                &table.name,
                units,
                input.return_consumed_capacity,
            ),
        })
    }

    /// Handle `GetItem`.
    pub fn handle_get_item(&self, input: GetItemInput) -> Result<GetItemOutput, DynamoDBError> {
        let table = self.catalog.require_for_items(&input.table_name)?;
        let state = table.read();
        state.ensure_active()?;

        let key = extract_key(&state.key_schema, &input.key).map_err(storage_error_to_dynamodb)?;
        let found = state.items.get(&key);
        let size = found.map_or(0, item_size);
        let units = read_units(size, input.consistent_read.unwrap_or(false));
        debug!(table = %table.name, found = found.is_some(), "get item");

        Ok(GetItemOutput {
            item: found.map(|item| project(item, &input.attributes_to_get)),
            consumed_capacity: consumed_capacity(
                &table.name,
                units,
                input.return_consumed_capacity,
            ),
        })
    }

    /// Handle `DeleteItem`.
    pub fn handle_delete_item(
        &self,
        input: DeleteItemInput,
    ) -> Result<DeleteItemOutput, DynamoDBError> {
        let table = self.catalog.require_for_items(&input.table_name)?;
        let mut state = table.write();
        state.ensure_active()?;

        let key = extract_key(&state.key_schema, &input.key).map_err(storage_error_to_dynamodb)?;
        let old = state.items.delete(&key);
        let units = write_units(old.as_ref().map_or(0, item_size));
        debug!(table = %table.name, removed = old.is_some(), "delete item");

        Ok(DeleteItemOutput {
            attributes: returned(old, input.return_values),
            consumed_capacity: consumed_capacity(
                &table.name,
                units,
                input.return_consumed_capacity,
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// Batch operations
// ---------------------------------------------------------------------------

impl LocalDynamoDB {
    /// Handle `BatchGetItem`.
    pub fn handle_batch_get_item(
        &self,
        input: BatchGetItemInput,
    ) -> Result<BatchGetItemOutput, DynamoDBError> {
        batch_get(&self.catalog, self.config.batch_get_budget, input)
    }

    /// Handle `BatchWriteItem`.
    pub fn handle_batch_write_item(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, DynamoDBError> {
        batch_write(&self.catalog, self.config.batch_write_budget, input)
    }
}
