//! # Custody Node
//!
//! Host runtime for the custody ledger.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `CUSTODY_*` environment variables
//! 2. Install the tracing subscriber (`RUST_LOG` overrides `CUSTODY_LOG`)
//! 3. Open the ledger file, verify stored chains and rebuild the snapshot
//! 4. Serve JSON-lines envelopes from stdin until end of input
//!
//! The node is the ledger's caller, so it owns the retry policy for
//! `SequenceConflict`. The ledger itself never retries.

pub mod config;
pub mod runtime;

pub use config::{ClockKind, ConfigError, NodeConfig};
pub use runtime::{NodeRuntime, NodeService};
