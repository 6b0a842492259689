//! Deferred table lifecycle transitions.
//!
//! Every lifecycle change that completes "later" (a table becoming ACTIVE,
//! an update settling, a deleted table disappearing) is recorded here keyed
//! by table name. Transitions carry the table id they were scheduled for, so
//! a transition left over from a deleted table never touches a new table of
//! the same name.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::provider::LocalDynamoDB;
use crate::state::TableCatalog;

/// What happens when a scheduled transition fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// CREATING to ACTIVE.
    Activate,
    /// UPDATING to ACTIVE, applying the pending throughput.
    FinishUpdate,
    /// DELETING to removed.
    Remove,
}

/// A transition waiting for its due time.
#[derive(Debug, Clone)]
pub struct ScheduledTransition {
    pub table_name: String,
    pub table_id: String,
    pub due: DateTime<Utc>,
    pub transition: Transition,
}

/// Pending transitions, at most one per table name.
#[derive(Debug, Default)]
pub struct LifecycleScheduler {
    pending: Mutex<HashMap<String, ScheduledTransition>>,
}

impl LifecycleScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a transition, replacing any pending one for the same table.
    pub fn schedule(&self, scheduled: ScheduledTransition) {
        debug!(
            table = %scheduled.table_name,
            transition = ?scheduled.transition,
            due = %scheduled.due,
            "scheduled lifecycle transition"
        );
        self.pending
            .lock()
            .insert(scheduled.table_name.clone(), scheduled);
    }

    /// Drop the pending transition for `table_name`, if any.
    pub fn cancel(&self, table_name: &str) -> Option<ScheduledTransition> {
        let cancelled = self.pending.lock().remove(table_name);
        if let Some(t) = &cancelled {
            debug!(
                table = %table_name,
                transition = ?t.transition,
                "cancelled lifecycle transition"
            );
        }
        cancelled
    }

    /// Remove and return every transition due at `now`, earliest first.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<ScheduledTransition> {
        let mut pending = self.pending.lock();
        let names: Vec<String> = pending
            .values()
            .filter(|t| t.due <= now)
            .map(|t| t.table_name.clone())
            .collect();
        let mut due: Vec<ScheduledTransition> =
            names.iter().filter_map(|n| pending.remove(n)).collect();
        due.sort_by(|a, b| a.due.cmp(&b.due).then_with(|| a.table_name.cmp(&b.table_name)));
        due
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    pub fn clear(&self) {
        self.pending.lock().clear();
    }
}

/// Apply one fired transition to the catalog.
///
/// Returns `false` when the table it was scheduled for no longer exists.
pub fn apply_transition(
    catalog: &TableCatalog,
    scheduled: &ScheduledTransition,
    now: DateTime<Utc>,
) -> bool {
    let name = &scheduled.table_name;
    if scheduled.transition == Transition::Remove {
        let removed = catalog.remove(name, &scheduled.table_id);
        if removed {
            info!(table = %name, "table deleted");
        }
        return removed;
    }

    let Some(table) = catalog
        .get(name)
        .filter(|t| t.table_id == scheduled.table_id)
    else {
        debug!(table = %name, "dropping transition for a table that is gone");
        return false;
    };
    let mut state = table.write();
    match scheduled.transition {
        Transition::Activate => {
            state.activate();
            info!(table = %name, "table is now ACTIVE");
        }
        Transition::FinishUpdate => {
            state.finish_update(now);
            info!(table = %name, "table update complete");
        }
        Transition::Remove => {}
    }
    true
}

/// Periodically apply due lifecycle transitions in the background.
pub fn spawn_lifecycle_driver(provider: Arc<LocalDynamoDB>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            provider.tick();
        }
    })
}
