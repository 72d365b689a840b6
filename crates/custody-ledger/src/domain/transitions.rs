//! # Transfer State Machine
//!
//! Pure transition functions. Each takes the current tail (if any), checks
//! input and authorization, and returns the next sealed entry. The clock is
//! read only once both checks pass, so rejected calls consume no timestamps. None of them
//! touch storage; appending the result is the store's job, and the store
//! rejects it if the tail moved in the meantime.
//!
//! ```text
//!            register(M, first=A)
//!                    │
//!                    ▼
//!   ┌────── [TRANSFERRED: M → A] ◀──────────────┐
//!   │                                           │
//!   │ confirm_receipt(A)                        │ transfer_to_next(A, next=C)
//!   ▼                                           │
//! [RECEIVED: A] ────────────────────────────────┘
//! ```

use super::chain::seal;
use super::entities::{
    CustodyEntry, CustodyStatus, ItemRecord, RegisterItem, Registration, TransferToNext,
};
use super::errors::{LedgerError, Operation};
use super::guard::authorize;
use super::identity::{derive_item_id, ItemId};
use super::value_objects::LedgerConfig;
use shared_types::{PartyId, Timestamp, ZERO_HASH};

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), LedgerError> {
    if value.len() > max {
        return Err(LedgerError::invalid(
            field,
            format!("length {} exceeds limit {}", value.len(), max),
        ));
    }
    Ok(())
}

fn check_party(field: &'static str, party: &PartyId, max: usize) -> Result<(), LedgerError> {
    if party.is_blank() {
        return Err(LedgerError::invalid(field, "must not be empty"));
    }
    check_len(field, party.as_str(), max)
}

/// Build the item record and entry #0 for a registration by `manufacturer`.
///
/// `existing` is the tail currently stored under the derived id, if any.
///
/// # Errors
///
/// - `InvalidInput`: blank serial/manufacturer/first holder, first holder equal
///   to the manufacturer, or a field over its length limit
/// - `DuplicateItem`: `existing` is present
pub fn register(
    manufacturer: &PartyId,
    request: &RegisterItem,
    existing: Option<&CustodyEntry>,
    now: impl FnOnce() -> Timestamp,
    config: &LedgerConfig,
) -> Result<Registration, LedgerError> {
    check_party("manufacturerId", manufacturer, config.max_field_len)?;
    check_len("serialNumber", &request.serial_number, config.max_field_len)?;
    let item_id = derive_item_id(manufacturer, &request.serial_number)?;

    check_len("displayName", &request.display_name, config.max_field_len)?;
    check_len("sourceLocation", &request.source_location, config.max_field_len)?;
    check_len(
        "destinationLocation",
        &request.destination_location,
        config.max_field_len,
    )?;
    check_len("remarks", &request.remarks, config.max_remarks_len)?;
    check_party("firstHolder", &request.first_holder, config.max_field_len)?;
    if &request.first_holder == manufacturer {
        return Err(LedgerError::invalid(
            "firstHolder",
            "must differ from the manufacturer",
        ));
    }

    authorize(Operation::Register, manufacturer, existing).into_result(
        &item_id,
        manufacturer,
        Operation::Register,
    )?;
    let now = now();

    let record = ItemRecord {
        item_id,
        serial_number: request.serial_number.clone(),
        display_name: request.display_name.clone(),
        manufacturer_id: manufacturer.clone(),
        remarks: request.remarks.clone(),
        created_at: now,
    };

    let entry = seal(CustodyEntry {
        item_id,
        sequence_number: 0,
        current_holder: manufacturer.clone(),
        next_holder: Some(request.first_holder.clone()),
        source_location: request.source_location.clone(),
        destination_location: request.destination_location.clone(),
        status: CustodyStatus::Transferred,
        remarks: request.remarks.clone(),
        timestamp: now,
        prev_hash: ZERO_HASH,
        entry_hash: ZERO_HASH,
    });

    Ok(Registration {
        item_id,
        record,
        entry,
    })
}

/// Build the RECEIVED entry recording `caller` taking possession.
///
/// Locations and remarks of the offer are carried forward.
///
/// # Errors
///
/// - `UnknownItem`: no tail
/// - `InvalidState`: tail is not an open offer
/// - `NotAuthorized`: caller is not the tail's next holder
pub fn confirm_receipt(
    item_id: &ItemId,
    caller: &PartyId,
    tail: Option<&CustodyEntry>,
    now: impl FnOnce() -> Timestamp,
) -> Result<CustodyEntry, LedgerError> {
    if caller.is_blank() {
        return Err(LedgerError::invalid("caller", "must not be empty"));
    }
    authorize(Operation::ConfirmReceipt, caller, tail).into_result(
        item_id,
        caller,
        Operation::ConfirmReceipt,
    )?;
    let tail = tail.ok_or(LedgerError::UnknownItem { item_id: *item_id })?;
    let now = now();

    Ok(seal(CustodyEntry {
        item_id: *item_id,
        sequence_number: tail.sequence_number + 1,
        current_holder: caller.clone(),
        next_holder: None,
        source_location: tail.source_location.clone(),
        destination_location: tail.destination_location.clone(),
        status: CustodyStatus::Received,
        remarks: tail.remarks.clone(),
        timestamp: now,
        prev_hash: tail.entry_hash,
        entry_hash: ZERO_HASH,
    }))
}

/// Build the TRANSFERRED entry offering the item from `caller` to
/// `request.next_holder`.
///
/// When the request names no source location, the item leaves from where the
/// previous entry delivered it.
///
/// # Errors
///
/// - `InvalidInput`: blank next holder, next holder equal to the caller, or a
///   field over its length limit
/// - `UnknownItem`: no tail
/// - `InvalidState`: tail is not RECEIVED (includes an outstanding offer)
/// - `NotAuthorized`: caller is not the current holder
pub fn transfer_to_next(
    item_id: &ItemId,
    caller: &PartyId,
    tail: Option<&CustodyEntry>,
    request: &TransferToNext,
    now: impl FnOnce() -> Timestamp,
    config: &LedgerConfig,
) -> Result<CustodyEntry, LedgerError> {
    if caller.is_blank() {
        return Err(LedgerError::invalid("caller", "must not be empty"));
    }
    check_party("nextHolder", &request.next_holder, config.max_field_len)?;
    if &request.next_holder == caller {
        return Err(LedgerError::invalid(
            "nextHolder",
            "must differ from the current holder",
        ));
    }
    check_len(
        "destinationLocation",
        &request.destination_location,
        config.max_field_len,
    )?;
    if let Some(source) = &request.source_location {
        check_len("sourceLocation", source, config.max_field_len)?;
    }
    check_len("remarks", &request.remarks, config.max_remarks_len)?;

    authorize(Operation::TransferToNext, caller, tail).into_result(
        item_id,
        caller,
        Operation::TransferToNext,
    )?;
    let tail = tail.ok_or(LedgerError::UnknownItem { item_id: *item_id })?;
    let now = now();

    let source_location = request
        .source_location
        .clone()
        .unwrap_or_else(|| tail.destination_location.clone());

    Ok(seal(CustodyEntry {
        item_id: *item_id,
        sequence_number: tail.sequence_number + 1,
        current_holder: caller.clone(),
        next_holder: Some(request.next_holder.clone()),
        source_location,
        destination_location: request.destination_location.clone(),
        status: CustodyStatus::Transferred,
        remarks: request.remarks.clone(),
        timestamp: now,
        prev_hash: tail.entry_hash,
        entry_hash: ZERO_HASH,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::chain::is_sealed;

    fn party(s: &str) -> PartyId {
        PartyId::from(s)
    }

    fn request(serial: &str, first: &str) -> RegisterItem {
        RegisterItem {
            serial_number: serial.into(),
            display_name: "Pallet".into(),
            source_location: "Factory".into(),
            destination_location: "Warehouse".into(),
            first_holder: party(first),
            remarks: "fragile".into(),
        }
    }

    fn offer(next: &str, destination: &str) -> TransferToNext {
        TransferToNext {
            next_holder: party(next),
            destination_location: destination.into(),
            remarks: String::new(),
            source_location: None,
        }
    }

    fn config() -> LedgerConfig {
        LedgerConfig::for_testing()
    }

    #[test]
    fn test_register_builds_offer_to_first_holder() {
        let reg = register(&party("M"), &request("SN1", "A"), None, || 10, &config()).unwrap();

        assert_eq!(reg.entry.sequence_number, 0);
        assert_eq!(reg.entry.current_holder, party("M"));
        assert_eq!(reg.entry.next_holder, Some(party("A")));
        assert_eq!(reg.entry.status, CustodyStatus::Transferred);
        assert_eq!(reg.entry.prev_hash, ZERO_HASH);
        assert!(is_sealed(&reg.entry));
        assert_eq!(reg.record.manufacturer_id, party("M"));
        assert_eq!(reg.record.created_at, 10);
        assert_eq!(reg.item_id, derive_item_id(&party("M"), "SN1").unwrap());
    }

    #[test]
    fn test_register_rejects_self_as_first_holder() {
        let err = register(&party("M"), &request("SN1", "M"), None, || 0, &config()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidInput {
                field: "firstHolder",
                ..
            }
        ));
    }

    #[test]
    fn test_register_rejects_blank_first_holder_and_serial() {
        assert!(register(&party("M"), &request("SN1", " "), None, || 0, &config()).is_err());
        assert!(matches!(
            register(&party("M"), &request("", "A"), None, || 0, &config()),
            Err(LedgerError::InvalidInput {
                field: "serialNumber",
                ..
            })
        ));
    }

    #[test]
    fn test_register_enforces_length_limits() {
        let mut req = request("SN1", "A");
        req.remarks = "x".repeat(config().max_remarks_len + 1);
        assert!(matches!(
            register(&party("M"), &req, None, || 0, &config()),
            Err(LedgerError::InvalidInput { field: "remarks", .. })
        ));
    }

    #[test]
    fn test_register_existing_is_duplicate() {
        let reg = register(&party("M"), &request("SN1", "A"), None, || 0, &config()).unwrap();
        let err = register(&party("M"), &request("SN1", "B"), Some(&reg.entry), || 1, &config())
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::DuplicateItem {
                item_id: reg.item_id
            }
        );
    }

    #[test]
    fn test_confirm_then_transfer_links_chain() {
        let reg = register(&party("M"), &request("SN1", "A"), None, || 0, &config()).unwrap();
        let id = reg.item_id;

        let received = confirm_receipt(&id, &party("A"), Some(&reg.entry), || 1).unwrap();
        assert_eq!(received.sequence_number, 1);
        assert_eq!(received.current_holder, party("A"));
        assert_eq!(received.next_holder, None);
        assert_eq!(received.status, CustodyStatus::Received);
        assert_eq!(received.destination_location, "Warehouse");
        assert_eq!(received.remarks, "fragile");
        assert_eq!(received.prev_hash, reg.entry.entry_hash);

        let offered =
            transfer_to_next(&id, &party("A"), Some(&received), &offer("C", "Store"), || 2, &config())
                .unwrap();
        assert_eq!(offered.sequence_number, 2);
        assert_eq!(offered.current_holder, party("A"));
        assert_eq!(offered.next_holder, Some(party("C")));
        assert_eq!(offered.status, CustodyStatus::Transferred);
        assert_eq!(offered.source_location, "Warehouse");
        assert_eq!(offered.destination_location, "Store");
        assert_eq!(offered.prev_hash, received.entry_hash);
    }

    #[test]
    fn test_confirm_by_wrong_party_denied() {
        let reg = register(&party("M"), &request("SN1", "A"), None, || 0, &config()).unwrap();
        assert!(matches!(
            confirm_receipt(&reg.item_id, &party("B"), Some(&reg.entry), || 1),
            Err(LedgerError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn test_transfer_while_offered_is_invalid_state() {
        let reg = register(&party("M"), &request("SN1", "A"), None, || 0, &config()).unwrap();
        let received = confirm_receipt(&reg.item_id, &party("A"), Some(&reg.entry), || 1).unwrap();
        let offered = transfer_to_next(
            &reg.item_id,
            &party("A"),
            Some(&received),
            &offer("C", "Store"),
            || 2,
            &config(),
        )
        .unwrap();

        let err = transfer_to_next(
            &reg.item_id,
            &party("A"),
            Some(&offered),
            &offer("D", "Elsewhere"),
            || 3,
            &config(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidState {
                status: CustodyStatus::Transferred,
                operation: Operation::TransferToNext,
                ..
            }
        ));
    }

    #[test]
    fn test_transfer_to_self_rejected() {
        let reg = register(&party("M"), &request("SN1", "A"), None, || 0, &config()).unwrap();
        let received = confirm_receipt(&reg.item_id, &party("A"), Some(&reg.entry), || 1).unwrap();
        assert!(matches!(
            transfer_to_next(
                &reg.item_id,
                &party("A"),
                Some(&received),
                &offer("A", "Store"),
                || 2,
                &config()
            ),
            Err(LedgerError::InvalidInput {
                field: "nextHolder",
                ..
            })
        ));
    }

    #[test]
    fn test_explicit_source_location_is_used() {
        let reg = register(&party("M"), &request("SN1", "A"), None, || 0, &config()).unwrap();
        let received = confirm_receipt(&reg.item_id, &party("A"), Some(&reg.entry), || 1).unwrap();
        let mut req = offer("C", "Store");
        req.source_location = Some("Dock 4".into());
        let offered =
            transfer_to_next(&reg.item_id, &party("A"), Some(&received), &req, || 2, &config())
                .unwrap();
        assert_eq!(offered.source_location, "Dock 4");
    }

    #[test]
    fn test_operations_on_missing_item_are_unknown() {
        let id = ItemId::from_bytes([1; 32]);
        assert_eq!(
            confirm_receipt(&id, &party("A"), None, || 0).unwrap_err(),
            LedgerError::UnknownItem { item_id: id }
        );
        assert_eq!(
            transfer_to_next(&id, &party("A"), None, &offer("C", "X"), || 0, &config()).unwrap_err(),
            LedgerError::UnknownItem { item_id: id }
        );
    }

    #[test]
    fn test_rejected_transitions_do_not_read_the_clock() {
        use std::cell::Cell;

        let reads = Cell::new(0u32);
        let clock = || {
            reads.set(reads.get() + 1);
            7
        };

        let reg = register(&party("M"), &request("SN1", "A"), None, clock, &config()).unwrap();
        assert_eq!(reads.get(), 1);
        assert_eq!(reg.entry.timestamp, 7);

        assert!(confirm_receipt(&reg.item_id, &party("B"), Some(&reg.entry), clock).is_err());
        assert!(transfer_to_next(
            &reg.item_id,
            &party("A"),
            Some(&reg.entry),
            &offer("C", "X"),
            clock,
            &config()
        )
        .is_err());
        assert!(
            register(&party("M"), &request("SN1", "A"), Some(&reg.entry), clock, &config()).is_err()
        );
        assert_eq!(reads.get(), 1);
    }
}
