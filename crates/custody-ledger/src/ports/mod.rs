//! # Ports Layer
//!
//! Defines the port traits for the custody ledger.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving ports (API exposed to hosts and the JSON gateway)
//! - `outbound.rs` - Driven ports (store, key-value backend, serializer, clock)

pub mod inbound;
pub mod outbound;
