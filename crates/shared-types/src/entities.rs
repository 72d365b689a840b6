//! # Core Domain Entities
//!
//! Primitive vocabulary shared by every crate in the workspace.
//!
//! - `PartyId`: opaque identity of a manufacturer, supplier or customer
//! - `Hash`: 32-byte SHA-256 digest
//! - `Timestamp`: logical or wall-clock tick supplied by the host

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

/// All-zero hash. Marks "no predecessor" in hash chains.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Logical timestamp. Ordering is meaningful, units are up to the host.
pub type Timestamp = u64;

/// Opaque identity of a party acting on the ledger.
///
/// The ledger never interprets the contents (wallet address, DID, user name):
/// two parties are the same iff their strings are byte-equal. Authentication
/// happens before a `PartyId` reaches the core.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct PartyId(String);

impl PartyId {
    /// Wrap an identity string as-is.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identity is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Raw bytes, used for key derivation.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PartyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for PartyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
