//! # Benchmarks
//!
//! Criterion bodies shared by `benches/ledger_benchmarks.rs`.

pub mod ledger;
