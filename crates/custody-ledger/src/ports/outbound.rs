//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the custody service.
//!
//! These are the interfaces the host application provides, or picks from
//! `adapters/`.

use crate::domain::entities::{CustodyEntry, ItemRecord};
use crate::domain::errors::{KVStoreError, LedgerError, SerializationError};
use crate::domain::identity::ItemId;
use crate::domain::snapshot::CustodySnapshot;
use shared_types::{PartyId, Timestamp};
use std::collections::BTreeSet;

/// The custody ledger store: append-only per-item histories plus the
/// current snapshot and its derived indexes.
///
/// Implementations must be safe to share across threads. Appends to one item
/// are serialized by the sequence check in `append_entry`, not by callers.
///
/// Production and testing: `KvCustodyStore` over any `KeyValueStore`.
pub trait CustodyStore: Send + Sync {
    /// Persist a new item record together with its entry #0.
    ///
    /// ## Errors
    ///
    /// - `DuplicateItem`: the id already has a record
    /// - `InvalidInput`: entry #0 is not a valid opening offer for the record
    fn create_item(&self, record: ItemRecord, genesis: CustodyEntry) -> Result<ItemId, LedgerError>;

    /// Append one entry to an existing history.
    ///
    /// ## Errors
    ///
    /// - `UnknownItem`: no record for `item_id`
    /// - `SequenceConflict`: `entry.sequence_number` is not tail + 1
    /// - `InvalidInput`: the entry does not link to the tail
    fn append_entry(&self, item_id: &ItemId, entry: CustodyEntry) -> Result<(), LedgerError>;

    /// Record for `item_id`, or `None`.
    fn find_item(&self, item_id: &ItemId) -> Result<Option<ItemRecord>, LedgerError>;

    /// Current tail for `item_id`, or `None`.
    fn find_tail(&self, item_id: &ItemId) -> Option<CustodyEntry>;

    /// Full history in sequence order.
    ///
    /// ## Errors
    ///
    /// - `UnknownItem`: no record for `item_id`
    fn get_history(&self, item_id: &ItemId) -> Result<Vec<CustodyEntry>, LedgerError>;

    fn list_by_holder(&self, party: &PartyId) -> BTreeSet<ItemId>;

    fn list_by_manufacturer(&self, party: &PartyId) -> BTreeSet<ItemId>;

    fn list_incoming(&self, party: &PartyId) -> BTreeSet<ItemId>;

    /// Copy of the current snapshot.
    fn snapshot(&self) -> CustodySnapshot;

    /// Record for `item_id`.
    ///
    /// ## Errors
    ///
    /// - `UnknownItem`: no record for `item_id`
    fn get_item(&self, item_id: &ItemId) -> Result<ItemRecord, LedgerError> {
        self.find_item(item_id)?
            .ok_or(LedgerError::UnknownItem { item_id: *item_id })
    }

    /// Current tail for `item_id`.
    ///
    /// ## Errors
    ///
    /// - `UnknownItem`: no record for `item_id`
    fn get_tail(&self, item_id: &ItemId) -> Result<CustodyEntry, LedgerError> {
        self.find_tail(item_id)
            .ok_or(LedgerError::UnknownItem { item_id: *item_id })
    }
}

/// Abstract interface for key-value database operations.
///
/// Production: `FileBackedKVStore`
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Put a single key-value pair.
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError>;

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError>;

    /// All pairs whose key starts with `prefix`, in ascending key order.
    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError>;
}

/// Result of a prefix scan.
pub type ScanResult = Vec<(Vec<u8>, Vec<u8>)>;

/// Batch operation for atomic writes.
///
/// The ledger never deletes, so a batch only carries puts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOperation {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Abstract interface for record encoding.
pub trait RecordSerializer: Send + Sync {
    fn serialize_record(&self, record: &ItemRecord) -> Result<Vec<u8>, SerializationError>;

    fn deserialize_record(&self, data: &[u8]) -> Result<ItemRecord, SerializationError>;

    fn serialize_entry(&self, entry: &CustodyEntry) -> Result<Vec<u8>, SerializationError>;

    fn deserialize_entry(&self, data: &[u8]) -> Result<CustodyEntry, SerializationError>;
}

/// Abstract interface for time operations (for testability).
pub trait TimeSource: Send + Sync {
    /// Timestamp for the next ledger event.
    fn now(&self) -> Timestamp;
}

impl<T: TimeSource + ?Sized> TimeSource for Box<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
