//! # Domain Layer
//!
//! Pure ledger logic: identities, entities, the entry hash chain, the
//! authorization guard, transitions and the derived snapshot. Nothing here
//! performs I/O.

pub mod chain;
pub mod entities;
pub mod errors;
pub mod guard;
pub mod identity;
pub mod snapshot;
pub mod transitions;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use guard::{authorize, Authorization, DenyReason};
pub use identity::{derive_item_id, ItemId};
pub use snapshot::{CustodySnapshot, LinkError};
pub use value_objects::{KeyPrefix, LedgerConfig};
