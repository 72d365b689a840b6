//! Storage Adapters
//!
//! Implementations of the `KeyValueStore` trait, plus the ledger store that
//! sits on top of them.

mod file;
mod ledger;
mod memory;

pub use file::FileBackedKVStore;
pub use ledger::KvCustodyStore;
pub use memory::InMemoryKVStore;
