//! # Custody Ledger
//!
//! Append-only chain-of-custody ledger for physical items moving from a
//! manufacturer through a sequence of holders.
//!
//! ## Handoff Protocol
//!
//! Every handoff is two-phase: the current holder offers the item to a named
//! party, and only that party can confirm receipt.
//!
//! ```text
//! Manufacturer M ──register(first=A)──→ [TRANSFERRED M→A]
//!                                              │ confirm_receipt(A)
//!                                              ▼
//!                                       [RECEIVED by A]
//!                                              │ transfer_to_next(A, next=C)
//!                                              ▼
//!                                       [TRANSFERRED A→C] ──→ ...
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | Sequence numbers contiguous from 0 per item | `CustodySnapshot::check_link` |
//! | Exactly one tail per item | `CustodySnapshot` |
//! | Receiver of entry n is the next holder named by entry n-1 | `CustodySnapshot::check_link` |
//! | At most one open offer per item | `guard::authorize` |
//! | Item record exists before any entry | `CustodyStore::create_item` |
//! | Rejected calls leave the ledger unchanged | store checks run before any write |
//! | Each entry commits to its predecessor | `chain::compute_entry_hash` |
//! | Indexes equal a replay of history | `CustodySnapshot::replay` |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Pure domain logic (identities, entities, guard, transitions, snapshot)
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `adapters/` - Key-value backends, serializer, clocks, JSON gateway
//! - `service/` - Application service implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! use custody_ledger::{CustodyLedgerApi, InMemoryCustodyService, LedgerConfig, RegisterItem};
//!
//! let ledger = InMemoryCustodyService::new_in_memory(LedgerConfig::default());
//!
//! let reg = ledger.register(&"acme".into(), RegisterItem { first_holder: "dist".into(), ..request })?;
//! ledger.confirm_receipt(&"dist".into(), &reg.item_id)?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{
    BincodeRecordSerializer, FileBackedKVStore, InMemoryKVStore, KvCustodyStore, LogicalClock,
    SystemTimeSource,
};
pub use domain::{
    derive_item_id, CustodyEntry, CustodySnapshot, CustodyStatus, ItemId, ItemRecord,
    LedgerConfig, LedgerError, LedgerErrorKind, Operation, RegisterItem, Registration,
    TransferToNext,
};
pub use ports::inbound::CustodyLedgerApi;
pub use ports::outbound::{CustodyStore, KeyValueStore, RecordSerializer, TimeSource};
pub use service::{CustodyDependencies, CustodyService, InMemoryCustodyService};

#[cfg(feature = "api")]
pub use adapters::api_handler::{handle_api_query, ApiGatewayHandler, ApiQueryError, ApiRequest, ApiResponse};
