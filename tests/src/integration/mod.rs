//! # Integration Tests
//!
//! Flows that cross the service, store, gateway and node boundaries.

pub mod concurrency;
pub mod custody_flows;
pub mod replay;
