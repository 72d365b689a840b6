//! # Shared Types Crate
//!
//! Types shared between the custody ledger core, its host runtime and the
//! test suite.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identity and hash types are defined once here.
//! - **Envelope Authority**: `AuthenticatedCall<T>` carries the caller; request
//!   payloads never repeat it.

pub mod entities;
pub mod envelope;

pub use entities::*;
pub use envelope::AuthenticatedCall;
