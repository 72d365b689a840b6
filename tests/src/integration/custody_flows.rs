//! # Custody Flow Tests
//!
//! End-to-end handoff chains over the file-backed store, the JSON gateway
//! and the node runtime.
//!
//! ## Flows Tested
//!
//! 1. **Multi-hop chain**: manufacturer → distributor → wholesaler → pharmacy
//! 2. **Restart**: history, indexes and clock survive reopening the file
//! 3. **Gateway**: the same chain driven through JSON method calls

#[cfg(test)]
mod tests {
    use custody_ledger::{
        BincodeRecordSerializer, CustodyDependencies, CustodyLedgerApi, CustodyService,
        CustodyStatus, FileBackedKVStore, InMemoryCustodyService, ItemId, KvCustodyStore,
        LedgerConfig, LedgerError, LogicalClock, RegisterItem, TransferToNext,
    };
    use custody_node::{NodeConfig, NodeRuntime};
    use serde_json::Value;
    use shared_types::PartyId;
    use std::path::Path;
    use tempfile::tempdir;

    type FileService =
        CustodyService<KvCustodyStore<FileBackedKVStore, BincodeRecordSerializer>, LogicalClock>;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn party(s: &str) -> PartyId {
        PartyId::from(s)
    }

    fn open_file_service(path: &Path) -> FileService {
        let config = LedgerConfig::default();
        let kv = FileBackedKVStore::open(path).unwrap();
        let store = KvCustodyStore::open(kv, BincodeRecordSerializer, &config).unwrap();
        let clock = match store.last_timestamp() {
            Some(last) => LogicalClock::starting_after(last),
            None => LogicalClock::new(),
        };
        CustodyService::new(
            CustodyDependencies {
                store,
                time_source: clock,
            },
            config,
        )
    }

    fn register_request(serial: &str, first_holder: &str) -> RegisterItem {
        RegisterItem {
            serial_number: serial.to_string(),
            display_name: "Amoxicillin 500mg".to_string(),
            source_location: "Plant, Pune".to_string(),
            destination_location: "Distributor, Mumbai".to_string(),
            first_holder: party(first_holder),
            remarks: "batch 42".to_string(),
        }
    }

    fn offer(next: &str, destination: &str) -> TransferToNext {
        TransferToNext {
            next_holder: party(next),
            destination_location: destination.to_string(),
            remarks: String::new(),
            source_location: None,
        }
    }

    /// Walk an item from `first` through `hops`, confirming each receipt.
    fn walk<A: CustodyLedgerApi>(ledger: &A, item_id: &ItemId, first: &str, hops: &[(&str, &str)]) {
        ledger.confirm_receipt(&party(first), item_id).unwrap();
        let mut holder = first;
        for &(next, destination) in hops {
            ledger
                .transfer_to_next(&party(holder), item_id, offer(next, destination))
                .unwrap();
            ledger.confirm_receipt(&party(next), item_id).unwrap();
            holder = next;
        }
    }

    // =============================================================================
    // MULTI-HOP CHAIN
    // =============================================================================

    #[test]
    fn test_multi_hop_chain_links_every_holder() {
        let ledger = InMemoryCustodyService::new_in_memory(LedgerConfig::default());
        let reg = ledger
            .register(&party("manufacturer"), register_request("AMX-1", "distributor"))
            .unwrap();

        walk(
            &ledger,
            &reg.item_id,
            "distributor",
            &[("wholesaler", "Warehouse, Thane"), ("pharmacy", "Pharmacy, Dadar")],
        );

        let history = ledger.get_history(&reg.item_id).unwrap();
        assert_eq!(history.len(), 6);

        // Each receipt is by the party the previous entry offered to.
        for pair in history.windows(2) {
            assert_eq!(pair[1].sequence_number, pair[0].sequence_number + 1);
            assert_eq!(pair[1].prev_hash, pair[0].entry_hash);
            if pair[1].status == CustodyStatus::Received {
                assert_eq!(pair[0].next_holder.as_ref(), Some(&pair[1].current_holder));
            }
        }

        // Locations carry forward from one hop to the next.
        assert_eq!(history[3].source_location, "Distributor, Mumbai");
        assert_eq!(history[3].destination_location, "Warehouse, Thane");
        assert_eq!(history[5].destination_location, "Pharmacy, Dadar");

        let tail = ledger.get_tail(&reg.item_id).unwrap();
        assert_eq!(tail.current_holder, party("pharmacy"));
        assert!(ledger.list_held_by(&party("pharmacy")).contains(&reg.item_id));
        assert!(ledger.list_held_by(&party("distributor")).is_empty());
        assert_eq!(ledger.verify_history(&reg.item_id).unwrap(), tail.entry_hash);
    }

    #[test]
    fn test_item_ids_are_scoped_by_manufacturer() {
        let ledger = InMemoryCustodyService::new_in_memory(LedgerConfig::default());
        let a = ledger
            .register(&party("maker-a"), register_request("SN-1", "dist"))
            .unwrap();
        let b = ledger
            .register(&party("maker-b"), register_request("SN-1", "dist"))
            .unwrap();

        assert_ne!(a.item_id, b.item_id);
        assert_eq!(ledger.list_incoming(&party("dist")).len(), 2);
        assert!(matches!(
            ledger.register(&party("maker-a"), register_request("SN-1", "other")),
            Err(LedgerError::DuplicateItem { .. })
        ));
    }

    #[test]
    fn test_offer_cannot_be_redirected() {
        let ledger = InMemoryCustodyService::new_in_memory(LedgerConfig::default());
        let reg = ledger
            .register(&party("m"), register_request("SN-1", "a"))
            .unwrap();
        ledger.confirm_receipt(&party("a"), &reg.item_id).unwrap();
        ledger
            .transfer_to_next(&party("a"), &reg.item_id, offer("b", "X"))
            .unwrap();

        assert!(matches!(
            ledger.transfer_to_next(&party("a"), &reg.item_id, offer("c", "Y")),
            Err(LedgerError::InvalidState { .. })
        ));
        assert!(matches!(
            ledger.confirm_receipt(&party("c"), &reg.item_id),
            Err(LedgerError::NotAuthorized { .. })
        ));
        assert_eq!(ledger.get_history(&reg.item_id).unwrap().len(), 3);
    }

    // =============================================================================
    // RESTART
    // =============================================================================

    #[test]
    fn test_file_ledger_survives_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custody.db");

        let (item_id, snapshot_before, last_ts) = {
            let ledger = open_file_service(&path);
            let reg = ledger
                .register(&party("m"), register_request("SN-1", "a"))
                .unwrap();
            walk(&ledger, &reg.item_id, "a", &[("b", "Clinic")]);
            let last = ledger.get_tail(&reg.item_id).unwrap().timestamp;
            (reg.item_id, ledger.snapshot(), last)
        };

        let ledger = open_file_service(&path);
        assert_eq!(ledger.snapshot(), snapshot_before);
        assert_eq!(ledger.replay_snapshot().unwrap(), snapshot_before);
        assert!(ledger.list_held_by(&party("b")).contains(&item_id));

        let next = ledger
            .transfer_to_next(&party("b"), &item_id, offer("c", "Ward 3"))
            .unwrap();
        assert_eq!(next.sequence_number, 4);
        assert!(next.timestamp > last_ts);
    }

    // =============================================================================
    // GATEWAY
    // =============================================================================

    fn envelope(caller: &str, method: &str, params: Value) -> String {
        serde_json::json!({
            "caller": caller,
            "payload": { "method": method, "params": params },
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_node_runs_a_handoff_over_json_lines() {
        let dir = tempdir().unwrap();
        let runtime = NodeRuntime::open(&NodeConfig {
            data_file: dir.path().join("node.db"),
            ..NodeConfig::default()
        })
        .unwrap();

        let register = envelope(
            "m",
            "custody_register",
            serde_json::json!({
                "serialNumber": "SN-1",
                "displayName": "Insulin",
                "sourceLocation": "Plant",
                "destinationLocation": "Depot",
                "firstHolder": "a",
            }),
        );
        let mut out = Vec::new();
        runtime.serve(register.as_bytes(), &mut out).await.unwrap();
        let response: Value = serde_json::from_slice(&out).unwrap();
        let item_id = response["result"]["itemId"].as_str().unwrap().to_string();

        let script = [
            envelope("a", "custody_confirmReceipt", serde_json::json!({ "itemId": item_id })),
            envelope(
                "a",
                "custody_transferToNext",
                serde_json::json!({ "itemId": item_id, "nextHolder": "b", "destinationLocation": "Clinic" }),
            ),
            envelope("b", "custody_listIncoming", Value::Null),
            envelope("b", "custody_verifyHistory", serde_json::json!({ "itemId": item_id })),
        ]
        .join("\n");

        let mut out = Vec::new();
        runtime.serve(script.as_bytes(), &mut out).await.unwrap();
        let responses: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["result"]["status"], "RECEIVED");
        assert_eq!(responses[1]["result"]["sourceLocation"], "Depot");
        assert_eq!(responses[2]["result"], serde_json::json!([item_id]));
        assert_eq!(responses[3]["result"]["headHash"], responses[1]["result"]["entryHash"]);
    }
}
