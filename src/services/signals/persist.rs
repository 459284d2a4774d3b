//! Change-detection persistence for scored signals.

use tracing::debug;

use crate::error::StoreError;
use crate::types::{ScoredSignal, SignalRecord};

/// Append-only store of signal rows.
///
/// Implementations isolate each call (one statement or transaction per
/// operation); callers never hold state across calls.
pub trait SignalRepository: Send + Sync {
    /// Append a row and return it as stored.
    fn insert(&self, signal: &ScoredSignal) -> Result<SignalRecord, StoreError>;

    /// Most recent row for a symbol.
    fn latest_for_symbol(&self, symbol: &str) -> Result<Option<SignalRecord>, StoreError>;

    /// Most recent rows across all symbols, newest first.
    fn latest(&self, limit: usize) -> Result<Vec<SignalRecord>, StoreError>;

    /// Most recent rows for one symbol, newest first.
    fn history(&self, symbol: &str, limit: usize) -> Result<Vec<SignalRecord>, StoreError>;
}

/// Result of [`save_if_changed`].
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    /// A new row was appended.
    Inserted(SignalRecord),
    /// Score, trend and breakout match the latest row; nothing written.
    Unchanged,
}

impl PersistOutcome {
    pub fn inserted(&self) -> bool {
        matches!(self, PersistOutcome::Inserted(_))
    }
}

/// Append `signal` unless the latest stored row for its symbol has the same
/// score, trend and breakout.
///
/// The read-then-write pair is not atomic; callers must not run it
/// concurrently for the same symbol.
pub fn save_if_changed<R: SignalRepository + ?Sized>(
    repo: &R,
    signal: &ScoredSignal,
) -> Result<PersistOutcome, StoreError> {
    let last = repo.latest_for_symbol(&signal.symbol)?;

    if let Some(last) = last {
        if !signal.differs_from(&last) {
            debug!("Signal for {} unchanged (score {})", signal.symbol, signal.score);
            return Ok(PersistOutcome::Unchanged);
        }
    }

    let record = repo.insert(signal)?;
    debug!(
        "Stored signal {} for {}: score {} {}",
        record.id, record.symbol, record.score, record.trend
    );
    Ok(PersistOutcome::Inserted(record))
}
