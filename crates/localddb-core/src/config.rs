//! Emulator configuration.

use std::env;
use std::time::Duration;

/// Emulator configuration.
#[derive(Debug, Clone)]
pub struct DynamoDBConfig {
    /// Region used in table ARNs.
    pub region: String,
    /// Account id used in table ARNs.
    pub account_id: String,
    /// Delay before a new table becomes ACTIVE.
    pub create_table_delay: Duration,
    /// Delay before an updated table returns to ACTIVE.
    pub update_table_delay: Duration,
    /// Delay before a deleting table disappears.
    pub delete_table_delay: Duration,
    /// Maximum item size in bytes.
    pub max_item_size: u64,
    /// Response size budget for a single `BatchGetItem` call.
    pub batch_get_budget: u64,
    /// Write size budget for a single `BatchWriteItem` call.
    pub batch_write_budget: u64,
    /// Maximum number of tables.
    pub max_tables: usize,
    /// Maximum number of tables simultaneously CREATING, UPDATING or DELETING.
    pub max_concurrent_lifecycle: usize,
    /// Log every rejected request at `info` level.
    pub verbose_errors: bool,
}

impl DynamoDBConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            region: env::var("LOCALDDB_REGION").unwrap_or(defaults.region),
            account_id: env::var("LOCALDDB_ACCOUNT_ID").unwrap_or(defaults.account_id),
            create_table_delay: env_millis("LOCALDDB_CREATE_TABLE_MS", defaults.create_table_delay),
            update_table_delay: env_millis("LOCALDDB_UPDATE_TABLE_MS", defaults.update_table_delay),
            delete_table_delay: env_millis("LOCALDDB_DELETE_TABLE_MS", defaults.delete_table_delay),
            max_item_size: env_u64("LOCALDDB_MAX_ITEM_SIZE", defaults.max_item_size),
            batch_get_budget: env_u64("LOCALDDB_BATCH_GET_BUDGET", defaults.batch_get_budget),
            batch_write_budget: env_u64("LOCALDDB_BATCH_WRITE_BUDGET", defaults.batch_write_budget),
            max_tables: env_usize("LOCALDDB_MAX_TABLES", defaults.max_tables),
            max_concurrent_lifecycle: env_usize(
                "LOCALDDB_MAX_CONCURRENT_LIFECYCLE",
                defaults.max_concurrent_lifecycle,
            ),
            verbose_errors: env_bool("LOCALDDB_VERBOSE_ERRORS", defaults.verbose_errors),
        }
    }

    /// Configuration whose lifecycle transitions are due immediately.
    ///
    /// Useful for tests that only care about item semantics.
    #[must_use]
    pub fn instant() -> Self {
        Self {
            create_table_delay: Duration::ZERO,
            update_table_delay: Duration::ZERO,
            delete_table_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for DynamoDBConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_owned(),
            account_id: "000000000000".to_owned(),
            create_table_delay: Duration::from_millis(500),
            update_table_delay: Duration::from_millis(500),
            delete_table_delay: Duration::from_millis(500),
            max_item_size: 400 * 1024,
            batch_get_budget: 1024 * 1024,
            batch_write_budget: 16 * 1024 * 1024,
            max_tables: 256,
            max_concurrent_lifecycle: 10,
            verbose_errors: false,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_millis(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map_or(default, Duration::from_millis)
}
