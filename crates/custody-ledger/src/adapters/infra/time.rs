use crate::ports::outbound::TimeSource;
use shared_types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Time source using system time (seconds since the Unix epoch).
#[derive(Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// Logical clock: every call returns the next value of a counter.
///
/// Gives strictly increasing, reproducible timestamps. Only accepted
/// transitions read it, so the same sequence of accepted calls yields
/// byte-identical histories; a call that loses an append race still consumes
/// one value. This is the default for the ledger.
#[derive(Debug, Default)]
pub struct LogicalClock {
    next: AtomicU64,
}

impl LogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume after `last`, e.g. the highest timestamp found on reload.
    pub fn starting_after(last: Timestamp) -> Self {
        Self {
            next: AtomicU64::new(last.saturating_add(1)),
        }
    }
}

impl TimeSource for LogicalClock {
    fn now(&self) -> Timestamp {
        self.next.fetch_add(1, Ordering::SeqCst)
    }
}
