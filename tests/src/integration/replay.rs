//! # Replay Properties
//!
//! Random operation sequences over a small cast of parties. After any
//! sequence, every history is contiguous and hash-linked, failed calls
//! added nothing, and replaying the histories rebuilds the live snapshot.

#[cfg(test)]
mod tests {
    use custody_ledger::{
        CustodyLedgerApi, CustodyStatus, InMemoryCustodyService, ItemId, LedgerConfig,
        RegisterItem, TransferToNext,
    };
    use proptest::prelude::*;
    use shared_types::PartyId;

    const PARTIES: [&str; 4] = ["maker", "dist", "shop", "clinic"];

    #[derive(Debug, Clone)]
    enum Op {
        Register { maker: usize, serial: u8, first: usize },
        Confirm { caller: usize, item: usize },
        Transfer { caller: usize, item: usize, next: usize },
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let who = 0..PARTIES.len();
        prop_oneof![
            (who.clone(), 0u8..4, who.clone())
                .prop_map(|(maker, serial, first)| Op::Register { maker, serial, first }),
            (who.clone(), 0usize..8).prop_map(|(caller, item)| Op::Confirm { caller, item }),
            (who.clone(), 0usize..8, who)
                .prop_map(|(caller, item, next)| Op::Transfer { caller, item, next }),
        ]
    }

    fn party(i: usize) -> PartyId {
        PartyId::from(PARTIES[i])
    }

    fn total_entries(ledger: &InMemoryCustodyService, items: &[ItemId]) -> usize {
        items
            .iter()
            .map(|id| ledger.get_history(id).map(|h| h.len()).unwrap_or(0))
            .sum()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_histories_replay_to_live_snapshot(ops in prop::collection::vec(op_strategy(), 1..60)) {
            let ledger = InMemoryCustodyService::new_in_memory(LedgerConfig::default());
            let mut items: Vec<ItemId> = Vec::new();

            for op in ops {
                let before = total_entries(&ledger, &items);
                let succeeded = match op {
                    Op::Register { maker, serial, first } => {
                        let result = ledger.register(&party(maker), RegisterItem {
                            serial_number: format!("SN-{}", serial),
                            display_name: "Lot".to_string(),
                            source_location: "Plant".to_string(),
                            destination_location: "Depot".to_string(),
                            first_holder: party(first),
                            remarks: String::new(),
                        });
                        match result {
                            Ok(reg) => {
                                items.push(reg.item_id);
                                true
                            }
                            Err(_) => false,
                        }
                    }
                    Op::Confirm { caller, item } => match items.get(item) {
                        Some(id) => ledger.confirm_receipt(&party(caller), id).is_ok(),
                        None => false,
                    },
                    Op::Transfer { caller, item, next } => match items.get(item) {
                        Some(id) => ledger
                            .transfer_to_next(&party(caller), id, TransferToNext {
                                next_holder: party(next),
                                destination_location: "Elsewhere".to_string(),
                                remarks: String::new(),
                                source_location: None,
                            })
                            .is_ok(),
                        None => false,
                    },
                };

                let after = total_entries(&ledger, &items);
                prop_assert_eq!(after, before + usize::from(succeeded));
            }

            for id in &items {
                let history = ledger.get_history(id).unwrap();
                for (i, entry) in history.iter().enumerate() {
                    prop_assert_eq!(entry.sequence_number, i as u64);
                }
                let tail = ledger.get_tail(id).unwrap();
                prop_assert_eq!(ledger.verify_history(id).unwrap(), tail.entry_hash);

                match tail.status {
                    CustodyStatus::Received => {
                        prop_assert!(ledger.list_held_by(&tail.current_holder).contains(id));
                    }
                    _ => {
                        let next = tail.next_holder.clone().unwrap();
                        prop_assert!(ledger.list_incoming(&next).contains(id));
                    }
                }
            }

            prop_assert_eq!(ledger.replay_snapshot().unwrap(), ledger.snapshot());
        }
    }
}
