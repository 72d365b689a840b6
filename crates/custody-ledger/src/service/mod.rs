//! # Custody Service
//!
//! The application service implementing `CustodyLedgerApi`.
//!
//! ## Architecture
//!
//! Every mutation follows the same path:
//!
//! 1. Read the item's tail from the store
//! 2. Run the pure transition (input checks, then the authorization guard)
//! 3. Append the sealed entry; the store re-checks it against the tail under
//!    its write lock and rejects it with `SequenceConflict` if the tail moved
//!
//! The service never retries. Dependencies are injected, so tests run over
//! an in-memory store and a logical clock.

mod helpers;
mod ledger;

use crate::adapters::{BincodeRecordSerializer, InMemoryKVStore, KvCustodyStore, LogicalClock};
use crate::domain::value_objects::LedgerConfig;
use crate::ports::outbound::{CustodyStore, TimeSource};

/// The custody service.
pub struct CustodyService<ST, TS>
where
    ST: CustodyStore,
    TS: TimeSource,
{
    /// Ledger store (histories, snapshot, indexes).
    pub(crate) store: ST,
    /// Time source for entry timestamps.
    pub(crate) time_source: TS,
    /// Service configuration.
    pub(crate) config: LedgerConfig,
}

/// Dependencies for CustodyService
pub struct CustodyDependencies<ST, TS> {
    pub store: ST,
    pub time_source: TS,
}

/// Service over an in-memory store with a logical clock.
pub type InMemoryCustodyService =
    CustodyService<KvCustodyStore<InMemoryKVStore, BincodeRecordSerializer>, LogicalClock>;

impl<ST, TS> CustodyService<ST, TS>
where
    ST: CustodyStore,
    TS: TimeSource,
{
    /// Create a new custody service with the given dependencies.
    pub fn new(deps: CustodyDependencies<ST, TS>, config: LedgerConfig) -> Self {
        Self {
            store: deps.store,
            time_source: deps.time_source,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Underlying store, for hosts that need snapshot-level access.
    pub fn store(&self) -> &ST {
        &self.store
    }
}

impl InMemoryCustodyService {
    /// Empty ledger, for tests and ephemeral use.
    pub fn new_in_memory(config: LedgerConfig) -> Self {
        Self::new(
            CustodyDependencies {
                store: KvCustodyStore::empty(InMemoryKVStore::new(), BincodeRecordSerializer),
                time_source: LogicalClock::new(),
            },
            config,
        )
    }
}
