//! Item size and capacity unit accounting.
//!
//! Sizes follow the service's rules: every attribute contributes its name
//! length plus its value size, numbers count half a byte per significant
//! digit plus one, and containers carry a small fixed overhead.

use std::collections::BTreeMap;

use localddb_model::AttributeValue;
use localddb_model::types::{Capacity, ConsumedCapacity, Item, ReturnConsumedCapacity};

use crate::number::Number;

/// Bytes covered by one read capacity unit.
pub const READ_UNIT_BYTES: u64 = 4096;
/// Bytes covered by one write capacity unit.
pub const WRITE_UNIT_BYTES: u64 = 1024;

// ---------------------------------------------------------------------------
// Item size
// ---------------------------------------------------------------------------

/// Size of an item in bytes.
///
/// - **S**: UTF-8 length
/// - **N**: `ceil(significant digits / 2) + 1`
/// - **B**: decoded byte length
/// - **Bool / Null**: 1 byte
/// - **SS / NS / BS**: sum of member sizes
/// - **L**: `3 + sum(1 + element)`
/// - **M**: `3 + sum(key + 1 + value)`
#[must_use]
#[allow(clippy::implicit_hasher)]
pub fn item_size(item: &Item) -> u64 {
    item.iter()
        .map(|(name, value)| name.len() as u64 + value_size(value))
        .sum()
}

/// Size of a single attribute value in bytes.
#[must_use]
pub fn value_size(value: &AttributeValue) -> u64 {
    match value {
        AttributeValue::S(s) => s.len() as u64,
        AttributeValue::N(n) => number_size(n),
        AttributeValue::B(b) => b.len() as u64,
        AttributeValue::Bool(_) | AttributeValue::Null(_) => 1,
        AttributeValue::Ss(v) => v.iter().map(|s| s.len() as u64).sum(),
        AttributeValue::Ns(v) => v.iter().map(|n| number_size(n)).sum(),
        AttributeValue::Bs(v) => v.iter().map(|b| b.len() as u64).sum(),
        AttributeValue::L(list) => 3 + list.iter().map(|e| 1 + value_size(e)).sum::<u64>(),
        AttributeValue::M(map) => {
            3 + map
                .iter()
                .map(|(k, v)| k.len() as u64 + 1 + value_size(v))
                .sum::<u64>()
        }
    }
}

fn number_size(text: &str) -> u64 {
    Number::parse(text).map_or_else(
        |_| text.len().div_ceil(2) as u64 + 1,
        |n| n.storage_size(),
    )
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Read units for an item of `size` bytes; a miss is charged as size zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn read_units(size: u64, consistent: bool) -> f64 {
    let units = size.div_ceil(READ_UNIT_BYTES).max(1) as f64;
    if consistent { units } else { units / 2.0 }
}

/// Write units for an item of `size` bytes.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn write_units(size: u64) -> f64 {
    size.div_ceil(WRITE_UNIT_BYTES).max(1) as f64
}

/// Build the capacity report for one table, if reporting was requested.
#[must_use]
pub fn consumed_capacity(
    table_name: &str,
    units: f64,
    mode: Option<ReturnConsumedCapacity>,
) -> Option<ConsumedCapacity> {
    let mode = mode.filter(ReturnConsumedCapacity::should_report)?;
    Some(ConsumedCapacity {
        capacity_units: units,
        table_name: table_name.to_owned(),
        table: mode.should_report_indexes().then_some(Capacity {
            capacity_units: units,
        }),
    })
}

/// Per-table unit totals accumulated across a batch.
#[derive(Debug, Default)]
pub struct CapacityLedger {
    units: BTreeMap<String, f64>,
}

impl CapacityLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `units` to `table`'s total.
    pub fn charge(&mut self, table: &str, units: f64) {
        *self.units.entry(table.to_owned()).or_default() += units;
    }

    /// Make sure `table` is reported even when nothing was charged to it.
    pub fn touch(&mut self, table: &str) {
        self.units.entry(table.to_owned()).or_default();
    }

    /// One report per table, in table-name order.
    #[must_use]
    pub fn report(self, mode: Option<ReturnConsumedCapacity>) -> Option<Vec<ConsumedCapacity>> {
        mode.filter(ReturnConsumedCapacity::should_report)?;
        Some(
            self.units
                .into_iter()
                .filter_map(|(table, units)| consumed_capacity(&table, units, mode))
                .collect(),
        )
    }
}
