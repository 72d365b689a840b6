//! # Inbound Ports (Driving Ports)
//!
//! The primary API of the custody ledger.
//!
//! Callers arrive already authenticated: `caller` is taken at face value and
//! only compared by equality against the identities recorded on the tail.

use crate::domain::entities::{CustodyEntry, ItemRecord, RegisterItem, Registration, TransferToNext};
use crate::domain::errors::LedgerError;
use crate::domain::identity::ItemId;
use shared_types::{Hash, PartyId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Primary API of the custody ledger.
///
/// Mutations are all-or-nothing: an `Err` leaves the ledger unchanged.
pub trait CustodyLedgerApi: Send + Sync {
    /// Register a new item and offer it to `request.first_holder`.
    ///
    /// ## Errors
    ///
    /// - `InvalidInput`: empty serial number, blank or self first holder, oversized field
    /// - `DuplicateItem`: `caller` already registered this serial number
    fn register(&self, caller: &PartyId, request: RegisterItem) -> Result<Registration, LedgerError>;

    /// Accept an open offer addressed to `caller`.
    ///
    /// ## Errors
    ///
    /// - `UnknownItem`: no such item
    /// - `InvalidState`: the item has no open offer
    /// - `NotAuthorized`: the offer names someone else
    /// - `SequenceConflict`: another operation on this item won the race
    fn confirm_receipt(&self, caller: &PartyId, item_id: &ItemId) -> Result<CustodyEntry, LedgerError>;

    /// Offer an item `caller` holds to the next party.
    ///
    /// ## Errors
    ///
    /// - `InvalidInput`: blank or self next holder, oversized field
    /// - `UnknownItem`: no such item
    /// - `InvalidState`: the item is not RECEIVED (includes an open offer)
    /// - `NotAuthorized`: `caller` is not the current holder
    /// - `SequenceConflict`: another operation on this item won the race
    fn transfer_to_next(
        &self,
        caller: &PartyId,
        item_id: &ItemId,
        request: TransferToNext,
    ) -> Result<CustodyEntry, LedgerError>;

    /// Immutable description of an item.
    fn get_item(&self, item_id: &ItemId) -> Result<ItemRecord, LedgerError>;

    /// Latest entry of an item.
    fn get_tail(&self, item_id: &ItemId) -> Result<CustodyEntry, LedgerError>;

    /// Full chain of custody, ordered by sequence number from 0.
    fn get_history(&self, item_id: &ItemId) -> Result<Vec<CustodyEntry>, LedgerError>;

    /// Items `party` has received and not yet offered onward.
    fn list_held_by(&self, party: &PartyId) -> BTreeSet<ItemId>;

    /// Items registered by `party`.
    fn list_manufactured_by(&self, party: &PartyId) -> BTreeSet<ItemId>;

    /// Items with an open offer naming `party` as next holder.
    fn list_incoming(&self, party: &PartyId) -> BTreeSet<ItemId>;

    /// Recompute an item's hash chain and return its head hash.
    ///
    /// ## Errors
    ///
    /// - `UnknownItem`: no such item
    /// - `DataCorruption`: first entry that fails verification
    fn verify_history(&self, item_id: &ItemId) -> Result<Hash, LedgerError>;
}

/// An `Arc`-shared service answers the same API.
impl<T: CustodyLedgerApi + ?Sized> CustodyLedgerApi for Arc<T> {
    fn register(&self, caller: &PartyId, request: RegisterItem) -> Result<Registration, LedgerError> {
        (**self).register(caller, request)
    }

    fn confirm_receipt(&self, caller: &PartyId, item_id: &ItemId) -> Result<CustodyEntry, LedgerError> {
        (**self).confirm_receipt(caller, item_id)
    }

    fn transfer_to_next(
        &self,
        caller: &PartyId,
        item_id: &ItemId,
        request: TransferToNext,
    ) -> Result<CustodyEntry, LedgerError> {
        (**self).transfer_to_next(caller, item_id, request)
    }

    fn get_item(&self, item_id: &ItemId) -> Result<ItemRecord, LedgerError> {
        (**self).get_item(item_id)
    }

    fn get_tail(&self, item_id: &ItemId) -> Result<CustodyEntry, LedgerError> {
        (**self).get_tail(item_id)
    }

    fn get_history(&self, item_id: &ItemId) -> Result<Vec<CustodyEntry>, LedgerError> {
        (**self).get_history(item_id)
    }

    fn list_held_by(&self, party: &PartyId) -> BTreeSet<ItemId> {
        (**self).list_held_by(party)
    }

    fn list_manufactured_by(&self, party: &PartyId) -> BTreeSet<ItemId> {
        (**self).list_manufactured_by(party)
    }

    fn list_incoming(&self, party: &PartyId) -> BTreeSet<ItemId> {
        (**self).list_incoming(party)
    }

    fn verify_history(&self, item_id: &ItemId) -> Result<Hash, LedgerError> {
        (**self).verify_history(item_id)
    }
}
