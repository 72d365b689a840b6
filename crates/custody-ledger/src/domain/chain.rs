//! # Entry Hash Chain
//!
//! Each entry commits to its predecessor through `prev_hash`, so a history can
//! be checked end to end without trusting the store that produced it.
//!
//! ```text
//! entry_hash = SHA-256( ENTRY_HASH_DOMAIN || prev_hash || item_id || sequence
//!                     || current_holder || next_holder? || source || destination
//!                     || status tag || remarks || timestamp )
//! ```
//!
//! Variable-length fields are length-prefixed (u64 BE) and the optional next
//! holder carries a presence byte, so the encoding is injective.

use super::entities::CustodyEntry;
use super::errors::LedgerError;
use super::identity::ItemId;
use sha2::{Digest, Sha256};
use shared_types::{Hash, ZERO_HASH};

/// Domain separation tag for entry hashing.
pub const ENTRY_HASH_DOMAIN: &[u8] = b"custody-ledger/entry/v1";

fn put_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// Hash every field of `entry` except `entry_hash` itself.
pub fn compute_entry_hash(entry: &CustodyEntry) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(ENTRY_HASH_DOMAIN);
    hasher.update(entry.prev_hash);
    hasher.update(entry.item_id.as_bytes());
    hasher.update(entry.sequence_number.to_be_bytes());
    put_bytes(&mut hasher, entry.current_holder.as_bytes());
    match &entry.next_holder {
        Some(next) => {
            hasher.update([1u8]);
            put_bytes(&mut hasher, next.as_bytes());
        }
        None => hasher.update([0u8]),
    }
    put_bytes(&mut hasher, entry.source_location.as_bytes());
    put_bytes(&mut hasher, entry.destination_location.as_bytes());
    hasher.update([entry.status.tag()]);
    put_bytes(&mut hasher, entry.remarks.as_bytes());
    hasher.update(entry.timestamp.to_be_bytes());
    hasher.finalize().into()
}

/// Fill in `entry_hash`.
pub fn seal(mut entry: CustodyEntry) -> CustodyEntry {
    entry.entry_hash = compute_entry_hash(&entry);
    entry
}

/// True if the stored `entry_hash` matches the entry's contents.
pub fn is_sealed(entry: &CustodyEntry) -> bool {
    compute_entry_hash(entry) == entry.entry_hash
}

/// Verify a full history and return the head hash.
///
/// Checks, for every entry: it belongs to `item_id`, its sequence number is
/// its position, `prev_hash` links to the previous entry (zero for entry 0),
/// and `entry_hash` matches its contents. Holder linkage is checked by
/// snapshot replay, not here.
///
/// # Errors
///
/// `DataCorruption` naming the first sequence number that fails.
pub fn verify_chain(item_id: &ItemId, entries: &[CustodyEntry]) -> Result<Hash, LedgerError> {
    let corrupt = |sequence: u64, reason: String| LedgerError::DataCorruption {
        item_id: *item_id,
        sequence,
        reason,
    };

    if entries.is_empty() {
        return Err(corrupt(0, "history is empty".to_string()));
    }

    let mut prev = ZERO_HASH;
    for (position, entry) in entries.iter().enumerate() {
        let position = position as u64;
        if &entry.item_id != item_id {
            return Err(corrupt(
                position,
                format!("entry belongs to {}", entry.item_id),
            ));
        }
        if entry.sequence_number != position {
            return Err(corrupt(
                position,
                format!("found sequence number {}", entry.sequence_number),
            ));
        }
        if entry.prev_hash != prev {
            return Err(corrupt(position, "previous hash does not link".to_string()));
        }
        if !is_sealed(entry) {
            return Err(corrupt(position, "entry hash mismatch".to_string()));
        }
        prev = entry.entry_hash;
    }

    Ok(prev)
}
