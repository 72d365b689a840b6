//! # Custody Ledger Benchmarks
//!
//! | Group | Measures |
//! |-------|----------|
//! | custody-registration | items registered per second |
//! | custody-handoff | one transfer plus confirmation |
//! | custody-verify | full chain verification by length |

use criterion::{criterion_group, criterion_main};
use custody_tests::benchmarks::ledger::{bench_handoff, bench_registration, bench_verify_history};

criterion_group!(
    benches,
    bench_registration,
    bench_handoff,
    bench_verify_history
);
criterion_main!(benches);
