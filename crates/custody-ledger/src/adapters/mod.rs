//! # Adapters Layer
//!
//! Implementations of outbound ports and the JSON gateway over the inbound
//! port.
//!
//! - `storage/` - Key-value backends and the ledger store built on them
//! - `serializer/` - Record encoding
//! - `infra/` - Clocks
//! - `api_handler/` - JSON method dispatch (feature `api`)

#[cfg(feature = "api")]
pub mod api_handler;
pub mod infra;
pub mod serializer;
pub mod storage;

pub use infra::{LogicalClock, SystemTimeSource};
pub use serializer::BincodeRecordSerializer;
pub use storage::{FileBackedKVStore, InMemoryKVStore, KvCustodyStore};
