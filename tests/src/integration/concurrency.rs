//! # Concurrency Tests
//!
//! Racing mutations against one shared service. Whatever the interleaving,
//! each item's history grows by exactly one entry per winning call, and
//! losers get `InvalidState` (they read the winner's tail) or
//! `SequenceConflict` (they read the old tail and lost the append).

#[cfg(test)]
mod tests {
    use custody_ledger::{
        CustodyLedgerApi, InMemoryCustodyService, ItemId, LedgerConfig, LedgerError,
        RegisterItem, TransferToNext,
    };
    use shared_types::PartyId;
    use std::sync::{Arc, Barrier};
    use std::thread;

    const RACERS: usize = 8;

    fn party(s: &str) -> PartyId {
        PartyId::from(s)
    }

    fn shared_ledger() -> Arc<InMemoryCustodyService> {
        Arc::new(InMemoryCustodyService::new_in_memory(LedgerConfig::default()))
    }

    fn register(ledger: &InMemoryCustodyService, serial: &str, first: &str) -> ItemId {
        ledger
            .register(
                &party("m"),
                RegisterItem {
                    serial_number: serial.to_string(),
                    display_name: "Crate".to_string(),
                    source_location: "Plant".to_string(),
                    destination_location: "Depot".to_string(),
                    first_holder: party(first),
                    remarks: String::new(),
                },
            )
            .unwrap()
            .item_id
    }

    fn is_race_loss(err: &LedgerError) -> bool {
        matches!(
            err,
            LedgerError::InvalidState { .. } | LedgerError::SequenceConflict { .. }
        )
    }

    /// Run `f(i)` on `RACERS` threads released together.
    fn race<T, F>(f: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(usize) -> T + Send + Sync + 'static,
    {
        let barrier = Arc::new(Barrier::new(RACERS));
        let f = Arc::new(f);
        let handles: Vec<_> = (0..RACERS)
            .map(|i| {
                let barrier = Arc::clone(&barrier);
                let f = Arc::clone(&f);
                thread::spawn(move || {
                    barrier.wait();
                    f(i)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn test_racing_transfers_one_offer_wins() {
        let ledger = shared_ledger();
        let id = register(&ledger, "SN-1", "a");
        ledger.confirm_receipt(&party("a"), &id).unwrap();

        let racer = Arc::clone(&ledger);
        let results = race(move |i| {
            racer.transfer_to_next(
                &party("a"),
                &id,
                TransferToNext {
                    next_holder: party(&format!("next-{}", i)),
                    destination_location: format!("Dock {}", i),
                    remarks: String::new(),
                    source_location: None,
                },
            )
        });

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(is_race_loss(err), "unexpected error: {}", err);
        }

        let history = ledger.get_history(&id).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(&history[2], winners[0]);

        let winner = winners[0].next_holder.clone().unwrap();
        assert!(ledger.list_incoming(&winner).contains(&id));
        assert!(ledger.list_held_by(&party("a")).is_empty());
    }

    #[test]
    fn test_racing_confirmations_record_one_receipt() {
        let ledger = shared_ledger();
        let id = register(&ledger, "SN-1", "a");

        let racer = Arc::clone(&ledger);
        let results = race(move |_| racer.confirm_receipt(&party("a"), &id));

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(is_race_loss));
        assert_eq!(ledger.get_history(&id).unwrap().len(), 2);
        assert_eq!(ledger.replay_snapshot().unwrap(), ledger.snapshot());
    }

    #[test]
    fn test_independent_items_do_not_interfere() {
        let ledger = shared_ledger();
        let ids: Vec<ItemId> = (0..RACERS)
            .map(|i| register(&ledger, &format!("SN-{}", i), &format!("holder-{}", i)))
            .collect();

        let racer = Arc::clone(&ledger);
        let ids_for_racers = ids.clone();
        let results = race(move |i| {
            let holder = party(&format!("holder-{}", i));
            racer.confirm_receipt(&holder, &ids_for_racers[i])
        });

        assert!(results.iter().all(|r| r.is_ok()));
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(ledger.get_history(id).unwrap().len(), 2);
            assert!(ledger
                .list_held_by(&party(&format!("holder-{}", i)))
                .contains(id));
        }
    }

    #[test]
    fn test_racing_duplicate_registrations() {
        let ledger = shared_ledger();

        let racer = Arc::clone(&ledger);
        let results = race(move |_| {
            racer.register(
                &party("m"),
                RegisterItem {
                    serial_number: "SN-dup".to_string(),
                    display_name: "Crate".to_string(),
                    source_location: "Plant".to_string(),
                    destination_location: "Depot".to_string(),
                    first_holder: party("a"),
                    remarks: String::new(),
                },
            )
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, LedgerError::DuplicateItem { .. })));
        assert_eq!(ledger.list_manufactured_by(&party("m")).len(), 1);
    }
}
