//! # Custody Ledger Benchmarks
//!
//! - Bulk registration throughput over the in-memory store
//! - Confirm/transfer round trip on a single item
//! - Full history verification as chains grow

use criterion::{black_box, BatchSize, BenchmarkId, Criterion, Throughput};
use custody_ledger::{
    CustodyLedgerApi, InMemoryCustodyService, ItemId, LedgerConfig, RegisterItem, TransferToNext,
};
use shared_types::PartyId;
use std::time::Duration;

fn ledger() -> InMemoryCustodyService {
    InMemoryCustodyService::new_in_memory(LedgerConfig::default())
}

fn request(serial: u64, first: &PartyId) -> RegisterItem {
    RegisterItem {
        serial_number: format!("SN-{:08}", serial),
        display_name: "Benchmark crate".to_string(),
        source_location: "Plant".to_string(),
        destination_location: "Depot".to_string(),
        first_holder: first.clone(),
        remarks: String::new(),
    }
}

fn offer(next: &PartyId) -> TransferToNext {
    TransferToNext {
        next_holder: next.clone(),
        destination_location: "Next stop".to_string(),
        remarks: String::new(),
        source_location: None,
    }
}

/// Register `count` items from one manufacturer.
pub fn bench_registration(c: &mut Criterion) {
    let mut group = c.benchmark_group("custody-registration");
    group.measurement_time(Duration::from_secs(5));

    let maker = PartyId::from("maker");
    let first = PartyId::from("dist");

    for count in [100u64, 1_000] {
        group.throughput(Throughput::Elements(count));
        group.bench_with_input(BenchmarkId::new("register_batch", count), &count, |b, &count| {
            b.iter_batched(
                ledger,
                |ledger| {
                    for serial in 0..count {
                        black_box(ledger.register(&maker, request(serial, &first)).ok());
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

/// One offer plus its confirmation, on an item that keeps growing.
pub fn bench_handoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("custody-handoff");

    let maker = PartyId::from("maker");
    let a = PartyId::from("a");
    let b_party = PartyId::from("b");

    let ledger = ledger();
    let id = match ledger.register(&maker, request(0, &a)) {
        Ok(reg) => reg.item_id,
        Err(e) => panic!("setup failed: {}", e),
    };
    let _ = ledger.confirm_receipt(&a, &id);

    // Ping-pong the item between two holders.
    let mut holders = (a, b_party);
    group.bench_function("transfer_and_confirm", |b| {
        b.iter(|| {
            let _ = ledger.transfer_to_next(&holders.0, &id, offer(&holders.1));
            let _ = black_box(ledger.confirm_receipt(&holders.1, &id));
            std::mem::swap(&mut holders.0, &mut holders.1);
        })
    });

    group.finish();
}

fn item_with_hops(ledger: &InMemoryCustodyService, hops: u64) -> ItemId {
    let a = PartyId::from("a");
    let b = PartyId::from("b");
    let id = match ledger.register(&PartyId::from("maker"), request(hops, &a)) {
        Ok(reg) => reg.item_id,
        Err(e) => panic!("setup failed: {}", e),
    };
    let _ = ledger.confirm_receipt(&a, &id);
    let (mut from, mut to) = (a, b);
    for _ in 0..hops {
        let _ = ledger.transfer_to_next(&from, &id, offer(&to));
        let _ = ledger.confirm_receipt(&to, &id);
        std::mem::swap(&mut from, &mut to);
    }
    id
}

/// `verify_history` cost against chain length.
pub fn bench_verify_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("custody-verify");

    for hops in [10u64, 100, 500] {
        let ledger = ledger();
        let id = item_with_hops(&ledger, hops);
        group.throughput(Throughput::Elements(2 * hops + 2));
        group.bench_with_input(BenchmarkId::new("verify_history", hops), &id, |b, id| {
            b.iter(|| black_box(ledger.verify_history(id).is_ok()))
        });
    }

    group.finish();
}
