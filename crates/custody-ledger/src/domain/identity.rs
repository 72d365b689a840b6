//! # Identity Key Scheme
//!
//! Derives the globally unique `ItemId` from a manufacturer identity and the
//! serial number that manufacturer chose.
//!
//! ```text
//! ItemId = SHA-256( DOMAIN_TAG
//!                 || len(manufacturer) as u64 BE || manufacturer
//!                 || len(serial)       as u64 BE || serial )
//! ```
//!
//! Length-prefixing both fields makes the pre-image encoding injective, so
//! distinct (manufacturer, serial) pairs can only collide through a SHA-256
//! collision. Two manufacturers may therefore reuse the same serial number.

use super::errors::LedgerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use shared_types::{Hash, PartyId};
use std::fmt;
use std::str::FromStr;

/// Domain separation tag for item id derivation.
pub const ITEM_ID_DOMAIN: &[u8] = b"custody-ledger/item-id/v1";

/// Unique, immutable identifier of one tracked item.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(Hash);

impl ItemId {
    /// Wrap raw digest bytes.
    pub const fn from_bytes(bytes: Hash) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

/// Derive the item id for `serial_number` registered by `manufacturer`.
///
/// # Errors
///
/// `InvalidInput` if either the serial number or the manufacturer is blank.
pub fn derive_item_id(manufacturer: &PartyId, serial_number: &str) -> Result<ItemId, LedgerError> {
    if serial_number.trim().is_empty() {
        return Err(LedgerError::invalid("serialNumber", "must not be empty"));
    }
    if manufacturer.is_blank() {
        return Err(LedgerError::invalid("manufacturerId", "must not be empty"));
    }

    let mut hasher = Sha256::new();
    hasher.update(ITEM_ID_DOMAIN);
    hasher.update((manufacturer.as_bytes().len() as u64).to_be_bytes());
    hasher.update(manufacturer.as_bytes());
    hasher.update((serial_number.len() as u64).to_be_bytes());
    hasher.update(serial_number.as_bytes());
    Ok(ItemId(hasher.finalize().into()))
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId(0x{}..)", hex::encode(&self.0[..6]))
    }
}

/// Drop a leading `0x` or `0X`.
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    match s.get(..2) {
        Some(prefix) if prefix.eq_ignore_ascii_case("0x") => &s[2..],
        _ => s,
    }
}

impl FromStr for ItemId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_hex_prefix(s);
        let bytes = hex::decode(digits)
            .map_err(|e| LedgerError::invalid("itemId", format!("not hex: {}", e)))?;
        let hash: Hash = bytes
            .try_into()
            .map_err(|_| LedgerError::invalid("itemId", "must be 32 bytes"))?;
        Ok(ItemId(hash))
    }
}

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
