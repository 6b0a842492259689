//! Multi-table batch reads and writes.
//!
//! Both operations resolve every table first, then lock the tables in
//! lexical name order and validate every key before touching any item, so a
//! rejected batch leaves no trace. Work beyond the size budget is handed back
//! as `UnprocessedKeys` / `UnprocessedItems` rather than failing the call.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use localddb_model::error::DynamoDBError;
use localddb_model::input::{BatchGetItemInput, BatchWriteItemInput};
use localddb_model::output::{BatchGetItemOutput, BatchWriteItemOutput};
use localddb_model::types::{KeysAndAttributes, WriteRequest};

use crate::capacity::{CapacityLedger, item_size, read_units, write_units};
use crate::error::storage_error_to_dynamodb;
use crate::state::{Table, TableCatalog, TableState};
use crate::storage::{PrimaryKey, extract_item_key, extract_key, project};

/// Message for a write batch naming the same key twice in one table.
pub const DUPLICATE_KEYS: &str = "Provided list of item keys contains duplicates";

fn resolve_tables<V>(
    catalog: &TableCatalog,
    requests: &BTreeMap<String, V>,
) -> Result<Vec<Arc<Table>>, DynamoDBError> {
    requests
        .keys()
        .map(|name| catalog.require_for_items(name))
        .collect()
}

// ---------------------------------------------------------------------------
// BatchGetItem
// ---------------------------------------------------------------------------

/// Read keys from several tables within a response size budget.
pub fn batch_get(
    catalog: &TableCatalog,
    budget: u64,
    input: BatchGetItemInput,
) -> Result<BatchGetItemOutput, DynamoDBError> {
    let requests: BTreeMap<String, KeysAndAttributes> = input.request_items.into_iter().collect();
    let tables = resolve_tables(catalog, &requests)?;
    let guards: Vec<_> = tables.iter().map(|table| table.read()).collect();

    for state in &guards {
        state.ensure_active()?;
    }
    let keys = requests
        .values()
        .zip(&guards)
        .map(|(request, state)| {
            request
                .keys
                .iter()
                .map(|key| extract_key(&state.key_schema, key))
                .collect::<Result<Vec<_>, _>>()
                .map_err(storage_error_to_dynamodb)
        })
        .collect::<Result<Vec<_>, DynamoDBError>>()?;

    let mut ledger = CapacityLedger::new();
    let mut responses = HashMap::with_capacity(requests.len());
    let mut unprocessed_keys = HashMap::new();
    let mut used = 0u64;
    let mut processed_any = false;
    let mut over_budget = false;

    for (((name, request), state), keys) in requests.iter().zip(&guards).zip(keys) {
        let consistent = request.consistent_read.unwrap_or(false);
        let mut found = Vec::new();
        let mut remaining = Vec::new();
        ledger.touch(name);

        for (raw, key) in request.keys.iter().zip(keys) {
            if over_budget {
                remaining.push(raw.clone());
                continue;
            }
            match state.items.get(&key) {
                Some(item) => {
                    let size = item_size(item);
                    if processed_any && used + size > budget {
                        over_budget = true;
                        remaining.push(raw.clone());
                        continue;
                    }
                    used += size;
                    ledger.charge(name, read_units(size, consistent));
                    found.push(project(item, &request.attributes_to_get));
                }
                None => ledger.charge(name, read_units(0, consistent)),
            }
            processed_any = true;
        }

        debug!(table = %name, found = found.len(), unprocessed = remaining.len(), "batch get");
        responses.insert(name.clone(), found);
        if !remaining.is_empty() {
            unprocessed_keys.insert(
                name.clone(),
                KeysAndAttributes {
                    keys: remaining,
                    attributes_to_get: request.attributes_to_get.clone(),
                    consistent_read: request.consistent_read,
                },
            );
        }
    }

    Ok(BatchGetItemOutput {
        responses,
        unprocessed_keys,
        consumed_capacity: ledger.report(input.return_consumed_capacity),
    })
}

// ---------------------------------------------------------------------------
// BatchWriteItem
// ---------------------------------------------------------------------------

fn put_keys(
    state: &TableState,
    requests: &[WriteRequest],
) -> Result<Vec<Option<PrimaryKey>>, DynamoDBError> {
    let indexes = state.index_keys();
    requests
        .iter()
        .map(|request| {
            request
                .put_request
                .as_ref()
                .map(|put| extract_item_key(&state.key_schema, &indexes, &put.item))
                .transpose()
                .map_err(storage_error_to_dynamodb)
        })
        .collect()
}

fn delete_keys(
    state: &TableState,
    requests: &[WriteRequest],
    keys: &mut [Option<PrimaryKey>],
) -> Result<(), DynamoDBError> {
    for (request, slot) in requests.iter().zip(keys.iter_mut()) {
        if let Some(delete) = &request.delete_request {
            let key =
                extract_key(&state.key_schema, &delete.key).map_err(storage_error_to_dynamodb)?;
            *slot = Some(key);
        }
    }
    Ok(())
}

/// Apply puts and deletes across several tables within a write size budget.
pub fn batch_write(
    catalog: &TableCatalog,
    budget: u64,
    input: BatchWriteItemInput,
) -> Result<BatchWriteItemOutput, DynamoDBError> {
    let requests: BTreeMap<String, Vec<WriteRequest>> = input.request_items.into_iter().collect();
    let tables = resolve_tables(catalog, &requests)?;
    let mut guards: Vec<_> = tables.iter().map(|table| table.write()).collect();

    for state in &guards {
        state.ensure_active()?;
    }
    let mut keys = requests
        .values()
        .zip(&guards)
        .map(|(list, state)| put_keys(state, list))
        .collect::<Result<Vec<_>, DynamoDBError>>()?;
    for ((list, state), slots) in requests.values().zip(&guards).zip(keys.iter_mut()) {
        delete_keys(state, list, slots)?;
    }
    for slots in &keys {
        let mut seen = HashSet::with_capacity(slots.len());
        if !slots.iter().flatten().all(|key| seen.insert(key)) {
            return Err(DynamoDBError::validation(DUPLICATE_KEYS));
        }
    }

    let mut ledger = CapacityLedger::new();
    let mut unprocessed_items: HashMap<String, Vec<WriteRequest>> = HashMap::new();
    let mut written = 0u64;
    let mut processed_any = false;
    let mut over_budget = false;

    for (((name, list), state), slots) in requests.into_iter().zip(guards.iter_mut()).zip(keys) {
        ledger.touch(&name);
        let mut remaining = Vec::new();

        for (request, key) in list.into_iter().zip(slots) {
            let Some(key) = key else {
                continue;
            };
            let size = match &request.put_request {
                Some(put) => item_size(&put.item),
                None => state.items.get(&key).map_or(0, item_size),
            };
            if over_budget || (processed_any && written + size > budget) {
                over_budget = true;
                remaining.push(request);
                continue;
            }
            written += size;
            processed_any = true;

            let units = match request.put_request {
                Some(put) => {
                    let old = state.items.put(key, put.item);
                    write_units(size.max(old.as_ref().map_or(0, item_size)))
                }
                None => {
                    state.items.delete(&key);
                    write_units(size)
                }
            };
            ledger.charge(&name, units);
        }

        debug!(table = %name, unprocessed = remaining.len(), "batch write");
        if !remaining.is_empty() {
            unprocessed_items.insert(name, remaining);
        }
    }

    Ok(BatchWriteItemOutput {
        unprocessed_items,
        consumed_capacity: ledger.report(input.return_consumed_capacity),
    })
}
