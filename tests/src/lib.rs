//! # Custody Ledger Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/       # Criterion bodies, driven from benches/
//! │   └── ledger.rs
//! │
//! └── integration/      # Cross-module flows
//!     ├── custody_flows.rs
//!     ├── concurrency.rs
//!     └── replay.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p custody-tests
//! cargo test -p custody-tests integration::concurrency
//! cargo bench -p custody-tests
//! ```

pub mod benchmarks;
pub mod integration;
