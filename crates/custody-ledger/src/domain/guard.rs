//! # Authorization Guard
//!
//! Pure predicates over (operation, caller, tail). Evaluated before any entry
//! is built, so a denied call never reaches the append path.
//!
//! | Operation | Tail required | Caller required |
//! |-----------|---------------|-----------------|
//! | register | none | any non-blank identity |
//! | confirmReceipt | offered (TRANSFERRED) | the tail's `next_holder` |
//! | transferToNext | RECEIVED | the tail's `current_holder` |
//!
//! The status check runs first: a call against the wrong state is
//! `InvalidState` regardless of who makes it.

use super::entities::{CustodyEntry, CustodyStatus};
use super::errors::{LedgerError, Operation};
use super::identity::ItemId;
use shared_types::PartyId;

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allow,
    Deny(DenyReason),
}

/// Why a call was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// Register on an id that already has a tail.
    AlreadyRegistered,
    /// Confirm or transfer on an id with no tail.
    NotRegistered,
    /// Tail status does not admit the operation.
    WrongStatus(CustodyStatus),
    /// Caller is not the identity the tail names for this operation.
    WrongCaller,
}

/// Decide whether `caller` may perform `operation` given the item's tail.
pub fn authorize(
    operation: Operation,
    caller: &PartyId,
    tail: Option<&CustodyEntry>,
) -> Authorization {
    use Authorization::{Allow, Deny};

    let tail = match (operation, tail) {
        (Operation::Register, None) => return Allow,
        (Operation::Register, Some(_)) => return Deny(DenyReason::AlreadyRegistered),
        (_, None) => return Deny(DenyReason::NotRegistered),
        (_, Some(tail)) => tail,
    };

    match operation {
        Operation::Register => Deny(DenyReason::AlreadyRegistered),
        Operation::ConfirmReceipt => {
            if !tail.status.is_offer() {
                Deny(DenyReason::WrongStatus(tail.status))
            } else if tail.next_holder.as_ref() != Some(caller) {
                Deny(DenyReason::WrongCaller)
            } else {
                Allow
            }
        }
        Operation::TransferToNext => {
            if tail.status != CustodyStatus::Received {
                Deny(DenyReason::WrongStatus(tail.status))
            } else if &tail.current_holder != caller {
                Deny(DenyReason::WrongCaller)
            } else {
                Allow
            }
        }
    }
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allow)
    }

    /// Map a denial onto the error the caller sees.
    pub fn into_result(
        self,
        item_id: &ItemId,
        caller: &PartyId,
        operation: Operation,
    ) -> Result<(), LedgerError> {
        let reason = match self {
            Authorization::Allow => return Ok(()),
            Authorization::Deny(reason) => reason,
        };
        Err(match reason {
            DenyReason::AlreadyRegistered => LedgerError::DuplicateItem { item_id: *item_id },
            DenyReason::NotRegistered => LedgerError::UnknownItem { item_id: *item_id },
            DenyReason::WrongStatus(status) => LedgerError::InvalidState {
                item_id: *item_id,
                operation,
                status,
            },
            DenyReason::WrongCaller => LedgerError::NotAuthorized {
                item_id: *item_id,
                caller: caller.clone(),
                operation,
            },
        })
    }
}
