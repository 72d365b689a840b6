//! # Key-Value Custody Store
//!
//! `CustodyStore` over any `KeyValueStore`.
//!
//! ## Layout
//!
//! | Key | Value |
//! |-----|-------|
//! | `i:{item_id}` | ItemRecord |
//! | `e:{item_id}{sequence BE}` | CustodyEntry |
//!
//! The snapshot is never persisted. Opening a store scans every record,
//! rejects entries stored without one, optionally verifies each hash chain,
//! and rebuilds the snapshot by replay.
//!
//! ## Concurrency
//!
//! One `RwLock` covers the backend and the snapshot. Reads share it; an append
//! takes it exclusively, re-checks the entry against the tail under the lock,
//! and only then writes. Two writers that built entries from the same tail
//! cannot both pass that check.

use crate::domain::chain::{is_sealed, verify_chain};
use crate::domain::entities::{CustodyEntry, ItemRecord};
use crate::domain::errors::LedgerError;
use crate::domain::identity::ItemId;
use crate::domain::snapshot::CustodySnapshot;
use crate::domain::value_objects::{KeyPrefix, LedgerConfig};
use crate::ports::outbound::{BatchOperation, CustodyStore, KeyValueStore, RecordSerializer};
use parking_lot::RwLock;
use shared_types::{PartyId, Timestamp};
use std::collections::BTreeSet;
use tracing::{debug, info};

struct State<KV> {
    kv: KV,
    snapshot: CustodySnapshot,
}

/// Ledger store backed by a key-value store.
pub struct KvCustodyStore<KV, S>
where
    KV: KeyValueStore,
    S: RecordSerializer,
{
    state: RwLock<State<KV>>,
    serializer: S,
}

impl<KV, S> KvCustodyStore<KV, S>
where
    KV: KeyValueStore,
    S: RecordSerializer,
{
    /// Open a store over `kv`, rebuilding the snapshot from whatever it holds.
    ///
    /// ## Errors
    ///
    /// - `DataCorruption`: a stored chain fails hash verification (when
    ///   `verify_chain_on_load` is set) or does not replay
    /// - `Storage` / `Serialization`: backend or decoding failures
    pub fn open(kv: KV, serializer: S, config: &LedgerConfig) -> Result<Self, LedgerError> {
        let histories = load_histories(&kv, &serializer)?;
        let entry_count: usize = histories.iter().map(|(_, entries)| entries.len()).sum();

        if config.verify_chain_on_load {
            for (record, entries) in &histories {
                verify_chain(&record.item_id, entries)?;
            }
        }

        let snapshot = CustodySnapshot::replay(histories)?;
        if !snapshot.is_empty() {
            info!(
                items = snapshot.len(),
                entries = entry_count,
                verified = config.verify_chain_on_load,
                "[custody] Rebuilt snapshot from storage"
            );
        }

        Ok(Self {
            state: RwLock::new(State { kv, snapshot }),
            serializer,
        })
    }

    /// Open over a backend known to be empty. Skips the reload scan.
    pub fn empty(kv: KV, serializer: S) -> Self {
        Self {
            state: RwLock::new(State {
                kv,
                snapshot: CustodySnapshot::new(),
            }),
            serializer,
        }
    }

    /// Highest timestamp on any tail, or `None` when empty.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        let state = self.state.read();
        state
            .snapshot
            .item_ids()
            .filter_map(|id| state.snapshot.tail(id))
            .map(|tail| tail.timestamp)
            .max()
    }

    /// Number of registered items.
    pub fn item_count(&self) -> usize {
        self.state.read().snapshot.len()
    }

    /// Give back the backend, e.g. to reopen it.
    pub fn into_kv(self) -> KV {
        self.state.into_inner().kv
    }
}

fn load_histories<KV, S>(
    kv: &KV,
    serializer: &S,
) -> Result<Vec<(ItemRecord, Vec<CustodyEntry>)>, LedgerError>
where
    KV: KeyValueStore,
    S: RecordSerializer,
{
    let mut histories = Vec::new();

    for (key, value) in kv.prefix_scan(KeyPrefix::Item.as_bytes())? {
        let item_id = KeyPrefix::parse_item_key(&key)
            .ok_or_else(|| LedgerError::Storage(format!("malformed item key {}", hex::encode(&key))))?;
        let record = serializer.deserialize_record(&value)?;
        if record.item_id != item_id {
            return Err(LedgerError::DataCorruption {
                item_id,
                sequence: 0,
                reason: format!("record stored under {} describes {}", item_id, record.item_id),
            });
        }

        let entries = kv
            .prefix_scan(&KeyPrefix::history_prefix(&item_id))?
            .into_iter()
            .map(|(_, bytes)| serializer.deserialize_entry(&bytes))
            .collect::<Result<Vec<_>, _>>()?;

        histories.push((record, entries));
    }

    // Every stored entry must belong to a stored record.
    let known: BTreeSet<ItemId> = histories.iter().map(|(record, _)| record.item_id).collect();
    for (key, _) in kv.prefix_scan(KeyPrefix::Entry.as_bytes())? {
        let (item_id, _) = KeyPrefix::parse_entry_key(&key)
            .ok_or_else(|| LedgerError::Storage(format!("malformed entry key {}", hex::encode(&key))))?;
        if !known.contains(&item_id) {
            return Err(LedgerError::DataCorruption {
                item_id,
                sequence: 0,
                reason: "entries without item record".to_string(),
            });
        }
    }

    Ok(histories)
}

impl<KV, S> CustodyStore for KvCustodyStore<KV, S>
where
    KV: KeyValueStore,
    S: RecordSerializer,
{
    fn create_item(&self, record: ItemRecord, genesis: CustodyEntry) -> Result<ItemId, LedgerError> {
        let item_id = record.item_id;
        let mut state = self.state.write();

        state
            .snapshot
            .check_genesis(&record, &genesis)
            .map_err(|e| e.into_append_error(&item_id))?;
        if !is_sealed(&genesis) {
            return Err(LedgerError::invalid("entryHash", "does not match entry contents"));
        }
        if state.kv.exists(&KeyPrefix::item_key(&item_id))? {
            return Err(LedgerError::DuplicateItem { item_id });
        }

        let batch = vec![
            BatchOperation::put(
                KeyPrefix::item_key(&item_id),
                self.serializer.serialize_record(&record)?,
            ),
            BatchOperation::put(
                KeyPrefix::entry_key(&item_id, 0),
                self.serializer.serialize_entry(&genesis)?,
            ),
        ];
        state.kv.atomic_batch_write(batch)?;
        state
            .snapshot
            .register(&record, genesis)
            .map_err(|e| e.into_append_error(&item_id))?;

        debug!(item_id = %item_id, "[custody] Stored item record and entry #0");
        Ok(item_id)
    }

    fn append_entry(&self, item_id: &ItemId, entry: CustodyEntry) -> Result<(), LedgerError> {
        if &entry.item_id != item_id {
            return Err(LedgerError::invalid("itemId", "entry belongs to a different item"));
        }

        let mut state = self.state.write();
        state
            .snapshot
            .check_link(&entry)
            .map_err(|e| e.into_append_error(item_id))?;
        if !is_sealed(&entry) {
            return Err(LedgerError::invalid("entryHash", "does not match entry contents"));
        }

        let sequence = entry.sequence_number;
        let bytes = self.serializer.serialize_entry(&entry)?;
        state.kv.put(&KeyPrefix::entry_key(item_id, sequence), &bytes)?;
        state
            .snapshot
            .apply(entry)
            .map_err(|e| e.into_append_error(item_id))?;

        debug!(item_id = %item_id, sequence, "[custody] Appended entry");
        Ok(())
    }

    fn find_item(&self, item_id: &ItemId) -> Result<Option<ItemRecord>, LedgerError> {
        let state = self.state.read();
        match state.kv.get(&KeyPrefix::item_key(item_id))? {
            Some(bytes) => Ok(Some(self.serializer.deserialize_record(&bytes)?)),
            None => Ok(None),
        }
    }

    fn find_tail(&self, item_id: &ItemId) -> Option<CustodyEntry> {
        self.state.read().snapshot.tail(item_id).cloned()
    }

    fn get_history(&self, item_id: &ItemId) -> Result<Vec<CustodyEntry>, LedgerError> {
        let state = self.state.read();
        if !state.snapshot.contains(item_id) {
            return Err(LedgerError::UnknownItem { item_id: *item_id });
        }
        state
            .kv
            .prefix_scan(&KeyPrefix::history_prefix(item_id))?
            .into_iter()
            .map(|(_, bytes)| {
                self.serializer
                    .deserialize_entry(&bytes)
                    .map_err(LedgerError::from)
            })
            .collect()
    }

    fn list_by_holder(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.state.read().snapshot.held_by(party)
    }

    fn list_by_manufacturer(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.state.read().snapshot.manufactured_by(party)
    }

    fn list_incoming(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.state.read().snapshot.incoming_for(party)
    }

    fn snapshot(&self) -> CustodySnapshot {
        self.state.read().snapshot.clone()
    }
}
