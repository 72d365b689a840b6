//! # Ledger Entities
//!
//! - `ItemRecord`: immutable description of an item, written once at registration
//! - `CustodyEntry`: one immutable link in an item's chain of custody
//! - `CustodyStatus`: closed set of handoff states
//! - `RegisterItem` / `TransferToNext`: request payloads (the caller travels
//!   separately, in the envelope)

use super::identity::ItemId;
use serde::{Deserialize, Serialize};
use shared_types::{Hash, PartyId, Timestamp};
use std::fmt;

/// Handoff state recorded on a custody entry.
///
/// ```text
/// register ──→ [TRANSFERRED] ──confirm──→ [RECEIVED] ──transfer──→ [TRANSFERRED] ...
/// ```
///
/// `Assigned` is an offered state with the same meaning as `Transferred`. The
/// state machine never produces it; it exists so histories written by older
/// tooling still decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyStatus {
    Assigned,
    Transferred,
    Received,
}

impl CustodyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustodyStatus::Assigned => "ASSIGNED",
            CustodyStatus::Transferred => "TRANSFERRED",
            CustodyStatus::Received => "RECEIVED",
        }
    }

    /// True while a named next holder has not yet confirmed.
    pub fn is_offer(&self) -> bool {
        matches!(self, CustodyStatus::Assigned | CustodyStatus::Transferred)
    }

    /// Stable byte tag used in entry hashing.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            CustodyStatus::Assigned => 0,
            CustodyStatus::Transferred => 1,
            CustodyStatus::Received => 2,
        }
    }
}

impl fmt::Display for CustodyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable description of a registered item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub item_id: ItemId,
    pub serial_number: String,
    pub display_name: String,
    /// Identity that registered the item.
    pub manufacturer_id: PartyId,
    pub remarks: String,
    pub created_at: Timestamp,
}

/// One link in an item's chain of custody.
///
/// Never mutated or deleted once appended. `entry_hash` commits to every
/// other field plus `prev_hash`, so any edit to stored history is detectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodyEntry {
    pub item_id: ItemId,
    /// Position in the chain, contiguous from 0.
    pub sequence_number: u64,
    /// Who holds the item (RECEIVED) or who released it (offered).
    pub current_holder: PartyId,
    /// Party that must confirm the offer; `None` once received.
    pub next_holder: Option<PartyId>,
    pub source_location: String,
    pub destination_location: String,
    pub status: CustodyStatus,
    pub remarks: String,
    pub timestamp: Timestamp,
    #[serde(with = "hex_hash")]
    pub prev_hash: Hash,
    #[serde(with = "hex_hash")]
    pub entry_hash: Hash,
}

impl CustodyEntry {
    /// True if this entry is an open offer naming `party` as recipient.
    pub fn is_offered_to(&self, party: &PartyId) -> bool {
        self.status.is_offer() && self.next_holder.as_ref() == Some(party)
    }

    /// True if `party` has confirmed possession and not yet released the item.
    pub fn is_held_by(&self, party: &PartyId) -> bool {
        self.status == CustodyStatus::Received && &self.current_holder == party
    }
}

/// Registration request issued by a manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterItem {
    pub serial_number: String,
    pub display_name: String,
    pub source_location: String,
    pub destination_location: String,
    /// First downstream party the item is offered to.
    pub first_holder: PartyId,
    #[serde(default)]
    pub remarks: String,
}

/// Offer issued by the current holder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferToNext {
    pub next_holder: PartyId,
    pub destination_location: String,
    #[serde(default)]
    pub remarks: String,
    /// Where the item leaves from. Defaults to the previous destination.
    #[serde(default)]
    pub source_location: Option<String>,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub item_id: ItemId,
    pub record: ItemRecord,
    pub entry: CustodyEntry,
}

/// Hex (de)serialization for 32-byte hashes.
pub(crate) mod hex_hash {
    use serde::{Deserialize, Deserializer, Serializer};
    use shared_types::Hash;

    pub fn serialize<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(hash))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hash, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(crate::domain::identity::strip_hex_prefix(&s))
            .map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("hash must be 32 bytes"))
    }
}
