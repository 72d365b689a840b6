//! Service helpers: clock access, rejection logging and audit replay.

use super::CustodyService;
use crate::domain::errors::{LedgerError, Operation};
use crate::domain::snapshot::CustodySnapshot;
use crate::ports::outbound::{CustodyStore, TimeSource};
use shared_types::{PartyId, Timestamp};
use tracing::{debug, error, warn};

impl<ST, TS> CustodyService<ST, TS>
where
    ST: CustodyStore,
    TS: TimeSource,
{
    pub(crate) fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Log a rejected mutation and hand the error back.
    pub(crate) fn rejected(
        &self,
        operation: Operation,
        caller: &PartyId,
        err: LedgerError,
    ) -> LedgerError {
        match &err {
            LedgerError::SequenceConflict { .. } => {
                debug!(%operation, %caller, error = %err, "[custody] Lost append race");
            }
            LedgerError::DataCorruption { .. }
            | LedgerError::Storage(_)
            | LedgerError::Serialization(_) => {
                error!(%operation, %caller, error = %err, "[custody] Ledger failure");
            }
            _ => {
                warn!(%operation, %caller, error = %err, "[custody] Rejected");
            }
        }
        err
    }

    /// Copy of the live snapshot.
    pub fn snapshot(&self) -> CustodySnapshot {
        self.store.snapshot()
    }

    /// Rebuild the snapshot from stored history alone.
    ///
    /// For an intact ledger the result equals `snapshot()`.
    ///
    /// ## Errors
    ///
    /// `DataCorruption` if a stored history does not replay.
    pub fn replay_snapshot(&self) -> Result<CustodySnapshot, LedgerError> {
        let live = self.store.snapshot();
        let histories = live
            .item_ids()
            .map(|id| Ok((self.store.get_item(id)?, self.store.get_history(id)?)))
            .collect::<Result<Vec<_>, LedgerError>>()?;
        CustodySnapshot::replay(histories)
    }
}
