//! # Custody Snapshot
//!
//! The only mutable state in the ledger: one tail per item plus three derived
//! indexes. Every change goes through `register` or `apply`, which check that
//! the new entry links to the current tail before touching anything. Live
//! appends and `replay` share that path, so folding a stored history from an
//! empty snapshot reproduces the live snapshot exactly.
//!
//! | Index | Contains item when tail is... |
//! |-------|-------------------------------|
//! | `held` | RECEIVED, keyed by `current_holder` |
//! | `incoming` | an open offer, keyed by `next_holder` |
//! | `manufactured` | always, keyed by the registering manufacturer |

use super::entities::{CustodyEntry, CustodyStatus, ItemRecord};
use super::errors::LedgerError;
use super::identity::ItemId;
use shared_types::{PartyId, ZERO_HASH};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Why an entry cannot follow the current tail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("item is not registered")]
    UnknownItem,
    #[error("item is already registered")]
    AlreadyRegistered,
    #[error("entry belongs to a different item")]
    ItemMismatch,
    #[error("expected sequence {expected}, got {actual}")]
    Sequence { expected: u64, actual: u64 },
    #[error("previous hash does not match the tail")]
    PrevHash,
    #[error("holder chain broken: {0}")]
    Holder(&'static str),
}

impl LinkError {
    /// Error for a rejected live append.
    pub fn into_append_error(self, item_id: &ItemId) -> LedgerError {
        match self {
            LinkError::UnknownItem => LedgerError::UnknownItem { item_id: *item_id },
            LinkError::AlreadyRegistered => LedgerError::DuplicateItem { item_id: *item_id },
            LinkError::Sequence { expected, actual } => LedgerError::SequenceConflict {
                item_id: *item_id,
                expected,
                actual,
            },
            LinkError::ItemMismatch => LedgerError::invalid("itemId", self.to_string()),
            LinkError::PrevHash => LedgerError::invalid("prevHash", self.to_string()),
            LinkError::Holder(_) => LedgerError::invalid("entry", self.to_string()),
        }
    }

    /// Error for a stored history that does not replay.
    pub fn into_corruption(self, item_id: &ItemId, sequence: u64) -> LedgerError {
        LedgerError::DataCorruption {
            item_id: *item_id,
            sequence,
            reason: self.to_string(),
        }
    }
}

/// Current state of every item, derived from the append-only history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustodySnapshot {
    tails: BTreeMap<ItemId, CustodyEntry>,
    held: BTreeMap<PartyId, BTreeSet<ItemId>>,
    incoming: BTreeMap<PartyId, BTreeSet<ItemId>>,
    manufactured: BTreeMap<PartyId, BTreeSet<ItemId>>,
}

impl CustodySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `entry` is a valid entry #0 for `record`.
    pub fn check_genesis(&self, record: &ItemRecord, entry: &CustodyEntry) -> Result<(), LinkError> {
        if self.tails.contains_key(&record.item_id) {
            return Err(LinkError::AlreadyRegistered);
        }
        if entry.item_id != record.item_id {
            return Err(LinkError::ItemMismatch);
        }
        if entry.sequence_number != 0 {
            return Err(LinkError::Sequence {
                expected: 0,
                actual: entry.sequence_number,
            });
        }
        if entry.prev_hash != ZERO_HASH {
            return Err(LinkError::PrevHash);
        }
        if !entry.status.is_offer() {
            return Err(LinkError::Holder("registration must open an offer"));
        }
        if entry.current_holder != record.manufacturer_id {
            return Err(LinkError::Holder("registration not released by the manufacturer"));
        }
        check_offer_target(entry)
    }

    /// Check that `entry` may follow the item's current tail.
    pub fn check_link(&self, entry: &CustodyEntry) -> Result<(), LinkError> {
        let tail = self
            .tails
            .get(&entry.item_id)
            .ok_or(LinkError::UnknownItem)?;

        let expected = tail.sequence_number + 1;
        if entry.sequence_number != expected {
            return Err(LinkError::Sequence {
                expected,
                actual: entry.sequence_number,
            });
        }
        if entry.prev_hash != tail.entry_hash {
            return Err(LinkError::PrevHash);
        }

        match entry.status {
            CustodyStatus::Received => {
                if !tail.status.is_offer() {
                    return Err(LinkError::Holder("receipt without an open offer"));
                }
                if tail.next_holder.as_ref() != Some(&entry.current_holder) {
                    return Err(LinkError::Holder("receiver is not the offered next holder"));
                }
                if entry.next_holder.is_some() {
                    return Err(LinkError::Holder("received entry names a next holder"));
                }
                Ok(())
            }
            CustodyStatus::Assigned | CustodyStatus::Transferred => {
                if tail.status != CustodyStatus::Received {
                    return Err(LinkError::Holder("offer while the item is not held"));
                }
                if entry.current_holder != tail.current_holder {
                    return Err(LinkError::Holder("offer not released by the current holder"));
                }
                check_offer_target(entry)
            }
        }
    }

    /// Add a new item with its entry #0.
    pub fn register(&mut self, record: &ItemRecord, entry: CustodyEntry) -> Result<(), LinkError> {
        self.check_genesis(record, &entry)?;
        self.manufactured
            .entry(record.manufacturer_id.clone())
            .or_default()
            .insert(record.item_id);
        self.index(&entry);
        self.tails.insert(record.item_id, entry);
        Ok(())
    }

    /// Move an item's tail to `entry`.
    pub fn apply(&mut self, entry: CustodyEntry) -> Result<(), LinkError> {
        self.check_link(&entry)?;
        if let Some(previous) = self.tails.remove(&entry.item_id) {
            self.unindex(&previous);
        }
        self.index(&entry);
        self.tails.insert(entry.item_id, entry);
        Ok(())
    }

    /// Rebuild a snapshot by folding full histories from empty state.
    ///
    /// # Errors
    ///
    /// `DataCorruption` at the first entry that does not link.
    pub fn replay<I>(histories: I) -> Result<Self, LedgerError>
    where
        I: IntoIterator<Item = (ItemRecord, Vec<CustodyEntry>)>,
    {
        let mut snapshot = Self::new();
        for (record, entries) in histories {
            let item_id = record.item_id;
            let mut entries = entries.into_iter();
            let genesis = entries.next().ok_or_else(|| LedgerError::DataCorruption {
                item_id,
                sequence: 0,
                reason: "history is empty".to_string(),
            })?;
            snapshot
                .register(&record, genesis)
                .map_err(|e| e.into_corruption(&item_id, 0))?;
            for entry in entries {
                let sequence = entry.sequence_number;
                if entry.item_id != item_id {
                    return Err(LinkError::ItemMismatch.into_corruption(&item_id, sequence));
                }
                snapshot
                    .apply(entry)
                    .map_err(|e| e.into_corruption(&item_id, sequence))?;
            }
        }
        Ok(snapshot)
    }

    fn index(&mut self, entry: &CustodyEntry) {
        if entry.status == CustodyStatus::Received {
            self.held
                .entry(entry.current_holder.clone())
                .or_default()
                .insert(entry.item_id);
        }
        if let Some(next) = entry.next_holder.as_ref().filter(|_| entry.status.is_offer()) {
            self.incoming
                .entry(next.clone())
                .or_default()
                .insert(entry.item_id);
        }
    }

    fn unindex(&mut self, entry: &CustodyEntry) {
        if entry.status == CustodyStatus::Received {
            remove_from(&mut self.held, &entry.current_holder, &entry.item_id);
        }
        if let Some(next) = &entry.next_holder {
            remove_from(&mut self.incoming, next, &entry.item_id);
        }
    }

    pub fn tail(&self, item_id: &ItemId) -> Option<&CustodyEntry> {
        self.tails.get(item_id)
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.tails.contains_key(item_id)
    }

    /// Number of registered items.
    pub fn len(&self) -> usize {
        self.tails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tails.is_empty()
    }

    /// All registered item ids in ascending order.
    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.tails.keys()
    }

    /// Items whose tail is RECEIVED by `party`.
    pub fn held_by(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.held.get(party).cloned().unwrap_or_default()
    }

    /// Items whose tail is an open offer naming `party`.
    pub fn incoming_for(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.incoming.get(party).cloned().unwrap_or_default()
    }

    /// Items registered by `party`.
    pub fn manufactured_by(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.manufactured.get(party).cloned().unwrap_or_default()
    }
}

fn check_offer_target(entry: &CustodyEntry) -> Result<(), LinkError> {
    match &entry.next_holder {
        Some(next) if !next.is_blank() && next != &entry.current_holder => Ok(()),
        _ => Err(LinkError::Holder("offer must name a different next holder")),
    }
}

// Empty sets are dropped so snapshots compare equal regardless of history.
fn remove_from(
    index: &mut BTreeMap<PartyId, BTreeSet<ItemId>>,
    party: &PartyId,
    item_id: &ItemId,
) {
    if let Some(set) = index.get_mut(party) {
        set.remove(item_id);
        if set.is_empty() {
            index.remove(party);
        }
    }
}
