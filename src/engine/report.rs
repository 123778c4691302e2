//! Result of one evaluation run.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::LifecycleEvent;

/// Summary and output of a completed run.
///
/// # Example
///
/// ```
/// use hr_lifecycle_engine::engine::RunReport;
/// use chrono::{NaiveDate, Utc};
/// use uuid::Uuid;
///
/// let report = RunReport {
///     run_id: Uuid::new_v4(),
///     started_at: Utc::now(),
///     evaluation_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
///     records_read: 0,
///     records_evaluated: 0,
///     candidates: 0,
///     suppressed: 0,
///     pruned: 0,
///     events: vec![],
///     duration_us: 12,
/// };
/// assert!(report.events.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier of the run, also used as the log correlation id.
    pub run_id: Uuid,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// The date the run treated as "today".
    pub evaluation_date: NaiveDate,
    /// Records in the snapshot.
    pub records_read: usize,
    /// Active records the rules were applied to.
    pub records_evaluated: usize,
    /// Candidate events before deduplication.
    pub candidates: usize,
    /// Candidates suppressed as already notified this period.
    pub suppressed: usize,
    /// Dedup entries from past periods removed during the run.
    pub pruned: usize,
    /// Events delivered to the sink, in delivery order.
    pub events: Vec<LifecycleEvent>,
    /// Total run duration in microseconds.
    pub duration_us: u64,
}
