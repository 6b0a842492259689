//! In-memory item storage for a single table.
//!
//! Items live in a [`BTreeMap`] keyed by a typed [`PrimaryKey`], so keys that
//! differ only in number formatting (`1`, `1.0`, `10e-1`) address the same
//! item. Key validation lives here as well: a supplied key must name exactly
//! the table's key attributes with matching types, and an item must carry
//! every key attribute.

use std::collections::BTreeMap;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use localddb_model::AttributeValue;
use localddb_model::types::{
    AttributeDefinition, Item, KeySchemaElement, KeyType, ScalarAttributeType,
};

use crate::capacity::{item_size, value_size};
use crate::number::{Number, NumberError};

/// Largest hash key value in bytes.
pub const MAX_HASH_KEY_SIZE: u64 = 2048;
/// Largest range key value in bytes.
pub const MAX_RANGE_KEY_SIZE: u64 = 1024;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while validating keys or items against a key schema.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A key does not name exactly the key attributes with the right types.
    #[error("The provided key element does not match the schema")]
    KeyMismatch,
    /// An item lacks one of the table's key attributes.
    #[error("One or more parameter values were invalid: Missing the key {attr} in the item")]
    MissingKeyAttribute {
        /// The missing attribute.
        attr: String,
    },
    /// An item carries a key attribute of the wrong type.
    #[error(
        "One or more parameter values were invalid: Type mismatch for key {attr} expected: {expected} actual: {actual}"
    )]
    InvalidKeyType {
        /// The attribute name.
        attr: String,
        /// The declared type.
        expected: String,
        /// The supplied type.
        actual: String,
    },
    /// An item carries an index key attribute of the wrong type.
    #[error(
        "One or more parameter values were invalid: Type mismatch for Index Key {attr} Expected: {expected} Actual: {actual} IndexName: {index}"
    )]
    InvalidIndexKeyType {
        /// The attribute name.
        attr: String,
        /// The declared type.
        expected: String,
        /// The supplied type.
        actual: String,
        /// The index declaring the attribute.
        index: String,
    },
    /// The hash key value is larger than 2048 bytes.
    #[error(
        "One or more parameter values were invalid: Size of hashkey has exceeded the maximum size limit of2048 bytes"
    )]
    HashKeyTooLarge,
    /// The range key value is larger than 1024 bytes.
    #[error(
        "One or more parameter values were invalid: Aggregated size of all range keys has exceeded the size limit of 1024 bytes"
    )]
    RangeKeyTooLarge,
    /// A stored number key could not be parsed.
    #[error(transparent)]
    Number(#[from] NumberError),
}

// ---------------------------------------------------------------------------
// Key schema
// ---------------------------------------------------------------------------

/// A key attribute with its declared scalar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    /// Attribute name.
    pub name: String,
    /// Declared type (S, N or B).
    pub attr_type: ScalarAttributeType,
}

/// Resolved key schema of a table or index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    /// HASH key.
    pub hash: KeyAttribute,
    /// Optional RANGE key.
    pub range: Option<KeyAttribute>,
}

impl KeySchema {
    /// Resolve key schema elements against attribute definitions.
    ///
    /// Returns `None` when the schema has no HASH element.
    #[must_use]
    pub fn resolve(
        elements: &[KeySchemaElement],
        definitions: &[AttributeDefinition],
    ) -> Option<Self> {
        let attribute = |key_type: KeyType| {
            let element = elements.iter().find(|e| e.key_type == key_type)?;
            let definition = definitions
                .iter()
                .find(|d| d.attribute_name == element.attribute_name)?;
            Some(KeyAttribute {
                name: element.attribute_name.clone(),
                attr_type: definition.attribute_type.clone(),
            })
        };
        Some(Self {
            hash: attribute(KeyType::Hash)?,
            range: attribute(KeyType::Range),
        })
    }

    /// Key attributes in schema order.
    pub fn attributes(&self) -> impl Iterator<Item = &KeyAttribute> {
        std::iter::once(&self.hash).chain(self.range.as_ref())
    }
}

/// Key attributes declared by a secondary index.
#[derive(Debug, Clone)]
pub struct IndexKeys {
    /// Index name.
    pub name: String,
    /// Index key schema.
    pub schema: KeySchema,
}

// ---------------------------------------------------------------------------
// Primary keys
// ---------------------------------------------------------------------------

/// A typed key attribute value.
///
/// Only one variant ever appears in a given key position, so the derived
/// cross-variant ordering never matters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyValue {
    /// String key, ordered by UTF-8 bytes.
    S(String),
    /// Number key, ordered numerically.
    N(Number),
    /// Binary key, ordered by unsigned bytes.
    B(Bytes),
}

impl KeyValue {
    fn from_attribute(value: &AttributeValue) -> Result<Option<Self>, StorageError> {
        Ok(match value {
            AttributeValue::S(s) => Some(Self::S(s.clone())),
            AttributeValue::N(n) => Some(Self::N(Number::parse(n)?)),
            AttributeValue::B(b) => Some(Self::B(b.clone())),
            _ => None,
        })
    }
}

/// A table's primary key: hash value plus optional range value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimaryKey {
    /// HASH key value.
    pub hash: KeyValue,
    /// RANGE key value, for tables that declare one.
    pub range: Option<KeyValue>,
}

fn matches_type(expected: &ScalarAttributeType, value: &AttributeValue) -> bool {
    matches!(
        (expected, value),
        (ScalarAttributeType::S, AttributeValue::S(_))
            | (ScalarAttributeType::N, AttributeValue::N(_))
            | (ScalarAttributeType::B, AttributeValue::B(_))
    )
}

fn check_key_sizes(schema: &KeySchema, source: &Item) -> Result<(), StorageError> {
    let key_size = |attr: &KeyAttribute| source.get(&attr.name).map_or(0, value_size);
    if key_size(&schema.hash) > MAX_HASH_KEY_SIZE {
        return Err(StorageError::HashKeyTooLarge);
    }
    if schema
        .range
        .as_ref()
        .is_some_and(|range| key_size(range) > MAX_RANGE_KEY_SIZE)
    {
        return Err(StorageError::RangeKeyTooLarge);
    }
    Ok(())
}

fn build_key(schema: &KeySchema, source: &Item) -> Result<PrimaryKey, StorageError> {
    let value = |attr: &KeyAttribute| {
        source
            .get(&attr.name)
            .map(KeyValue::from_attribute)
            .transpose()
            .map(Option::flatten)
    };
    let hash = value(&schema.hash)?.ok_or(StorageError::KeyMismatch)?;
    let range = match &schema.range {
        Some(attr) => Some(value(attr)?.ok_or(StorageError::KeyMismatch)?),
        None => None,
    };
    Ok(PrimaryKey { hash, range })
}

/// Validate a supplied key and build its [`PrimaryKey`].
///
/// The key must name exactly the schema's attributes, each with the
/// declared type.
///
/// # Errors
///
/// Returns [`StorageError::KeyMismatch`] for any shape or type mismatch, or a
/// key size error.
#[allow(clippy::implicit_hasher)]
pub fn extract_key(schema: &KeySchema, key: &Item) -> Result<PrimaryKey, StorageError> {
    let conforms = key.len() == schema.attributes().count()
        && schema.attributes().all(|attr| {
            key.get(&attr.name)
                .is_some_and(|value| matches_type(&attr.attr_type, value))
        });
    if !conforms {
        return Err(StorageError::KeyMismatch);
    }
    check_key_sizes(schema, key)?;
    build_key(schema, key)
}

/// Validate an item's key attributes and build its [`PrimaryKey`].
///
/// Index key attributes are optional, but when present must carry the
/// type their index declares.
///
/// # Errors
///
/// Returns [`StorageError::MissingKeyAttribute`],
/// [`StorageError::InvalidKeyType`], [`StorageError::InvalidIndexKeyType`]
/// or a key size error.
#[allow(clippy::implicit_hasher)]
pub fn extract_item_key(
    schema: &KeySchema,
    indexes: &[IndexKeys],
    item: &Item,
) -> Result<PrimaryKey, StorageError> {
    for attr in schema.attributes() {
        let value = item
            .get(&attr.name)
            .ok_or_else(|| StorageError::MissingKeyAttribute {
                attr: attr.name.clone(),
            })?;
        if !matches_type(&attr.attr_type, value) {
            return Err(StorageError::InvalidKeyType {
                attr: attr.name.clone(),
                expected: attr.attr_type.to_string(),
                actual: value.type_descriptor().to_owned(),
            });
        }
    }

    for index in indexes {
        for attr in index.schema.attributes() {
            if let Some(value) = item.get(&attr.name) {
                if !matches_type(&attr.attr_type, value) {
                    return Err(StorageError::InvalidIndexKeyType {
                        attr: attr.name.clone(),
                        expected: attr.attr_type.to_string(),
                        actual: value.type_descriptor().to_owned(),
                        index: index.name.clone(),
                    });
                }
            }
        }
    }

    check_key_sizes(schema, item)?;
    build_key(schema, item)
}

// ---------------------------------------------------------------------------
// ItemStore
// ---------------------------------------------------------------------------

/// Items of one table, keyed by primary key.
///
/// Not synchronized on its own; the owning table guards it with a lock.
#[derive(Debug, Default)]
pub struct ItemStore {
    items: BTreeMap<PrimaryKey, Item>,
    size_bytes: u64,
}

impl ItemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.len() as u64
    }

    /// Total size of stored items in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Look up an item.
    #[must_use]
    pub fn get(&self, key: &PrimaryKey) -> Option<&Item> {
        self.items.get(key)
    }

    /// Stored items in key order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Insert or replace an item, returning the item it replaced.
    pub fn put(&mut self, key: PrimaryKey, item: Item) -> Option<Item> {
        let new_size = item_size(&item);
        self.size_bytes += new_size;
        let old = self.items.insert(key, item);
        if let Some(old) = &old {
            let old_size = item_size(old);
            self.size_bytes = self.size_bytes.saturating_sub(old_size);
            debug!(old_size, new_size, "replaced existing item");
        } else {
            debug!(new_size, "inserted new item");
        }
        old
    }

    /// Remove an item, returning it if it existed.
    pub fn delete(&mut self, key: &PrimaryKey) -> Option<Item> {
        let removed = self.items.remove(key)?;
        let size = item_size(&removed);
        self.size_bytes = self.size_bytes.saturating_sub(size);
        debug!(size, "deleted item");
        Some(removed)
    }
}

/// Keep only the named attributes of an item.
#[must_use]
#[allow(clippy::implicit_hasher)]
pub fn project(item: &Item, attributes: &[String]) -> Item {
    if attributes.is_empty() {
        return item.clone();
    }
    attributes
        .iter()
        .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
