//! Collaborator interfaces the engine runs against.
//!
//! Every I/O the engine performs goes through one of these traits, at a
//! well-defined phase boundary of a run. Implementations live in
//! [`crate::store`].

use chrono::NaiveDate;

use crate::error::EngineResult;
use crate::models::{DedupKey, EmployeeRecord, LifecycleEvent, ReferencePeriod};

/// Reads the employee roster from the persistence collaborator.
pub trait RecordSource {
    /// Reads every employee record as of `as_of`, in one blocking call.
    ///
    /// Failures should be reported as [`EngineError::DataAccess`](crate::error::EngineError::DataAccess).
    fn read_all(&self, as_of: NaiveDate) -> EngineResult<Vec<EmployeeRecord>>;
}

/// Remembers which events were already notified, and for which period.
///
/// This is the only state the engine persists. Implementations must make
/// `put` and `put_all` atomic and durable across restarts.
pub trait DedupStore {
    /// Returns the period last recorded for `key`, if any.
    fn get(&self, key: &DedupKey) -> EngineResult<Option<ReferencePeriod>>;

    /// Records that `key` was notified for `period`.
    fn put(&mut self, key: &DedupKey, period: &ReferencePeriod) -> EngineResult<()>;

    /// Records a whole delivered batch.
    ///
    /// Durable stores should override this to persist once per batch.
    fn put_all(&mut self, entries: &[(DedupKey, ReferencePeriod)]) -> EngineResult<()> {
        for (key, period) in entries {
            self.put(key, period)?;
        }
        Ok(())
    }

    /// Forgets entries whose period ended before `evaluation_date`.
    ///
    /// Every key embeds its period, so such entries can never suppress a
    /// future candidate. Returns the number of entries removed.
    fn prune_before(&mut self, evaluation_date: NaiveDate) -> EngineResult<usize>;
}

/// Receives the final ordered batch (notification, document generation).
pub trait EventSink {
    /// Accepts the whole batch or fails it; partial delivery is the sink's concern.
    fn deliver(&mut self, events: &[LifecycleEvent]) -> EngineResult<()>;
}
