//! `CustodyLedgerApi` implementation.

use super::CustodyService;
use crate::domain::chain::verify_chain;
use crate::domain::entities::{
    CustodyEntry, ItemRecord, RegisterItem, Registration, TransferToNext,
};
use crate::domain::errors::{LedgerError, Operation};
use crate::domain::identity::{derive_item_id, ItemId};
use crate::domain::transitions;
use crate::ports::inbound::CustodyLedgerApi;
use crate::ports::outbound::{CustodyStore, TimeSource};
use shared_types::{Hash, PartyId};
use std::collections::BTreeSet;
use tracing::info;

impl<ST, TS> CustodyLedgerApi for CustodyService<ST, TS>
where
    ST: CustodyStore,
    TS: TimeSource,
{
    fn register(&self, caller: &PartyId, request: RegisterItem) -> Result<Registration, LedgerError> {
        let registration = self
            .try_register(caller, &request)
            .map_err(|e| self.rejected(Operation::Register, caller, e))?;
        info!(
            item_id = %registration.item_id,
            manufacturer = %caller,
            first_holder = %request.first_holder,
            "[custody] Registered item"
        );
        Ok(registration)
    }

    fn confirm_receipt(&self, caller: &PartyId, item_id: &ItemId) -> Result<CustodyEntry, LedgerError> {
        let tail = self.store.find_tail(item_id);
        let entry = transitions::confirm_receipt(item_id, caller, tail.as_ref(), || self.now())
            .and_then(|entry| self.append(item_id, entry))
            .map_err(|e| self.rejected(Operation::ConfirmReceipt, caller, e))?;
        info!(
            item_id = %item_id,
            holder = %caller,
            sequence = entry.sequence_number,
            "[custody] Receipt confirmed"
        );
        Ok(entry)
    }

    fn transfer_to_next(
        &self,
        caller: &PartyId,
        item_id: &ItemId,
        request: TransferToNext,
    ) -> Result<CustodyEntry, LedgerError> {
        let tail = self.store.find_tail(item_id);
        let entry = transitions::transfer_to_next(
            item_id,
            caller,
            tail.as_ref(),
            &request,
            || self.now(),
            &self.config,
        )
        .and_then(|entry| self.append(item_id, entry))
        .map_err(|e| self.rejected(Operation::TransferToNext, caller, e))?;
        info!(
            item_id = %item_id,
            from = %caller,
            to = %request.next_holder,
            sequence = entry.sequence_number,
            "[custody] Transfer offered"
        );
        Ok(entry)
    }

    fn get_item(&self, item_id: &ItemId) -> Result<ItemRecord, LedgerError> {
        self.store.get_item(item_id)
    }

    fn get_tail(&self, item_id: &ItemId) -> Result<CustodyEntry, LedgerError> {
        self.store.get_tail(item_id)
    }

    fn get_history(&self, item_id: &ItemId) -> Result<Vec<CustodyEntry>, LedgerError> {
        self.store.get_history(item_id)
    }

    fn list_held_by(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.store.list_by_holder(party)
    }

    fn list_manufactured_by(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.store.list_by_manufacturer(party)
    }

    fn list_incoming(&self, party: &PartyId) -> BTreeSet<ItemId> {
        self.store.list_incoming(party)
    }

    fn verify_history(&self, item_id: &ItemId) -> Result<Hash, LedgerError> {
        let history = self.store.get_history(item_id)?;
        verify_chain(item_id, &history)
    }
}

impl<ST, TS> CustodyService<ST, TS>
where
    ST: CustodyStore,
    TS: TimeSource,
{
    fn try_register(
        &self,
        caller: &PartyId,
        request: &RegisterItem,
    ) -> Result<Registration, LedgerError> {
        let item_id = derive_item_id(caller, &request.serial_number)?;
        let existing = self.store.find_tail(&item_id);
        let registration =
            transitions::register(caller, request, existing.as_ref(), || self.now(), &self.config)?;
        self.store
            .create_item(registration.record.clone(), registration.entry.clone())?;
        Ok(registration)
    }

    fn append(&self, item_id: &ItemId, entry: CustodyEntry) -> Result<CustodyEntry, LedgerError> {
        self.store.append_entry(item_id, entry.clone())?;
        Ok(entry)
    }
}
