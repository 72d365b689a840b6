//! # Domain Errors
//!
//! Error types for the custody ledger.
//!
//! Every `LedgerError` is terminal for the call that produced it and leaves the
//! ledger unchanged. Only `SequenceConflict` is expected under normal
//! concurrent use, and only it is safe to retry after re-reading the tail.

use super::entities::CustodyStatus;
use super::identity::ItemId;
use serde::{Deserialize, Serialize};
use shared_types::PartyId;
use thiserror::Error;

/// Operation names used in error context and authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Register,
    ConfirmReceipt,
    TransferToNext,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Register => "register",
            Operation::ConfirmReceipt => "confirmReceipt",
            Operation::TransferToNext => "transferToNext",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A required field is empty, too long, or otherwise malformed.
    #[error("Invalid input for `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Registration of an item id that already exists.
    #[error("Item already registered: {item_id}")]
    DuplicateItem { item_id: ItemId },

    /// No item with this id.
    #[error("Unknown item: {item_id}")]
    UnknownItem { item_id: ItemId },

    /// The caller is not the party entitled to perform the operation.
    #[error("Caller {caller} is not authorized to {operation} item {item_id}")]
    NotAuthorized {
        item_id: ItemId,
        caller: PartyId,
        operation: Operation,
    },

    /// The operation is illegal for the item's current status.
    #[error("Cannot {operation} item {item_id} while its status is {status}")]
    InvalidState {
        item_id: ItemId,
        operation: Operation,
        status: CustodyStatus,
    },

    /// Lost-update race: the entry was built against a stale tail.
    #[error("Sequence conflict on item {item_id}: expected sequence {expected}, got {actual}")]
    SequenceConflict {
        item_id: ItemId,
        expected: u64,
        actual: u64,
    },

    /// Stored history failed hash-chain or linkage verification.
    #[error("Corrupted history for item {item_id} at sequence {sequence}: {reason}")]
    DataCorruption {
        item_id: ItemId,
        sequence: u64,
        reason: String,
    },

    /// Backing key-value store failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Record encoding/decoding failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LedgerError {
    /// Shorthand for `InvalidInput`.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Coarse error class for wire payloads.
    pub fn kind(&self) -> LedgerErrorKind {
        match self {
            LedgerError::InvalidInput { .. } => LedgerErrorKind::InvalidInput,
            LedgerError::DuplicateItem { .. } => LedgerErrorKind::DuplicateItem,
            LedgerError::UnknownItem { .. } => LedgerErrorKind::UnknownItem,
            LedgerError::NotAuthorized { .. } => LedgerErrorKind::NotAuthorized,
            LedgerError::InvalidState { .. } => LedgerErrorKind::InvalidState,
            LedgerError::SequenceConflict { .. } => LedgerErrorKind::SequenceConflict,
            LedgerError::DataCorruption { .. } => LedgerErrorKind::DataCorruption,
            LedgerError::Storage(_) => LedgerErrorKind::Storage,
            LedgerError::Serialization(_) => LedgerErrorKind::Serialization,
        }
    }

    /// True only for errors a caller may resolve by re-reading the tail and
    /// reapplying the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::SequenceConflict { .. })
    }
}

/// Serializable error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerErrorKind {
    InvalidInput,
    DuplicateItem,
    UnknownItem,
    NotAuthorized,
    InvalidState,
    SequenceConflict,
    DataCorruption,
    Storage,
    Serialization,
}

impl LedgerErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerErrorKind::InvalidInput => "InvalidInput",
            LedgerErrorKind::DuplicateItem => "DuplicateItem",
            LedgerErrorKind::UnknownItem => "UnknownItem",
            LedgerErrorKind::NotAuthorized => "NotAuthorized",
            LedgerErrorKind::InvalidState => "InvalidState",
            LedgerErrorKind::SequenceConflict => "SequenceConflict",
            LedgerErrorKind::DataCorruption => "DataCorruption",
            LedgerErrorKind::Storage => "Storage",
            LedgerErrorKind::Serialization => "Serialization",
        }
    }
}

/// Key-value store errors.
#[derive(Debug, Clone, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    IOError { message: String },
    /// Data corruption in the store.
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

impl From<KVStoreError> for LedgerError {
    fn from(err: KVStoreError) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

/// Record serialization errors.
#[derive(Debug, Clone, Error)]
#[error("Serialization error: {message}")]
pub struct SerializationError {
    pub message: String,
}

impl From<SerializationError> for LedgerError {
    fn from(err: SerializationError) -> Self {
        LedgerError::Serialization(err.message)
    }
}
