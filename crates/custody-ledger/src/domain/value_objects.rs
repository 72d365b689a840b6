//! # Value Objects
//!
//! Ledger configuration and key layout for the key-value store.

use super::identity::ItemId;

/// Configuration for the custody ledger.
///
/// All values have defaults suitable for production use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Maximum byte length of identities, serial numbers, names and locations
    /// (default: 256).
    pub max_field_len: usize,

    /// Maximum byte length of free-text remarks (default: 4096).
    pub max_remarks_len: usize,

    /// Recompute every entry hash when reopening a persisted ledger
    /// (default: true).
    ///
    /// Snapshot replay still validates sequence and holder linkage when this
    /// is off.
    pub verify_chain_on_load: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_field_len: 256,
            max_remarks_len: 4096,
            verify_chain_on_load: true,
        }
    }
}

impl LedgerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum identity/name/location length.
    pub fn with_max_field_len(mut self, len: usize) -> Self {
        self.max_field_len = len;
        self
    }

    /// Set the maximum remarks length.
    pub fn with_max_remarks_len(mut self, len: usize) -> Self {
        self.max_remarks_len = len;
        self
    }

    /// Enable or disable hash-chain verification on load.
    pub fn with_verify_chain_on_load(mut self, verify: bool) -> Self {
        self.verify_chain_on_load = verify;
        self
    }

    /// Small limits so tests can hit them cheaply.
    pub fn for_testing() -> Self {
        Self {
            max_field_len: 64,
            max_remarks_len: 128,
            verify_chain_on_load: true,
        }
    }
}

/// Key prefixes for the key-value store.
///
/// All keys are prefixed to namespace different record types.
#[derive(Debug, Clone, Copy)]
pub enum KeyPrefix {
    /// Item records: `i:{item_id}` -> ItemRecord
    Item,
    /// Custody entries: `e:{item_id}{sequence BE}` -> CustodyEntry
    Entry,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Item => b"i:",
            KeyPrefix::Entry => b"e:",
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    /// Build an item record key.
    pub fn item_key(item_id: &ItemId) -> Vec<u8> {
        KeyPrefix::Item.key(item_id.as_bytes())
    }

    /// Prefix covering every entry of one item.
    pub fn history_prefix(item_id: &ItemId) -> Vec<u8> {
        KeyPrefix::Entry.key(item_id.as_bytes())
    }

    /// Build an entry key. Big-endian sequence numbers keep a prefix scan in
    /// chain order.
    pub fn entry_key(item_id: &ItemId, sequence: u64) -> Vec<u8> {
        let mut key = Self::history_prefix(item_id);
        key.extend_from_slice(&sequence.to_be_bytes());
        key
    }

    /// Recover the item id from an item record key.
    pub fn parse_item_key(key: &[u8]) -> Option<ItemId> {
        let suffix = key.strip_prefix(KeyPrefix::Item.as_bytes())?;
        let bytes: [u8; 32] = suffix.try_into().ok()?;
        Some(ItemId::from_bytes(bytes))
    }

    /// Recover the item id and sequence number from an entry key.
    pub fn parse_entry_key(key: &[u8]) -> Option<(ItemId, u64)> {
        let suffix = key.strip_prefix(KeyPrefix::Entry.as_bytes())?;
        if suffix.len() != 40 {
            return None;
        }
        let (id, sequence) = suffix.split_at(32);
        let id: [u8; 32] = id.try_into().ok()?;
        let sequence: [u8; 8] = sequence.try_into().ok()?;
        Some((ItemId::from_bytes(id), u64::from_be_bytes(sequence)))
    }
}
