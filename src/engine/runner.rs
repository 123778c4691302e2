//! Batch run orchestration.
//!
//! A run proceeds through fixed phases, each a possible failure point:
//!
//! ```text
//! policy (validated at construction)
//!   -> snapshot load        (RecordSource)               DataAccess aborts
//!   -> rule evaluation      (pure)
//!   -> dedup lookup         (DedupStore::get)            DataAccess aborts
//!   -> prune past periods   (DedupStore::prune_before)   DataAccess aborts
//!   -> ordering
//!   -> delivery             (EventSink)                  SinkDelivery aborts, no write-back
//!   -> dedup write-back     (DedupStore::put_all)        DataAccess, events re-offered next run
//! ```
//!
//! Failed runs are retried wholesale by the next scheduled invocation.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use tracing::{error, info, info_span, warn};
use uuid::Uuid;

use crate::config::PolicyConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{LifecycleEvent, RecordSnapshot};

use super::aggregator::{collect_candidates, order_events, suppress_already_notified};
use super::ports::{DedupStore, EventSink, RecordSource};
use super::report::RunReport;

/// Evaluates lifecycle rules under one validated policy.
///
/// # Example
///
/// ```
/// use hr_lifecycle_engine::config::PolicyConfig;
/// use hr_lifecycle_engine::engine::LifecycleEngine;
/// use hr_lifecycle_engine::models::{EmployeeRecord, Gender};
/// use hr_lifecycle_engine::store::{CollectingSink, InMemoryDedupStore, InMemoryRecordSource};
/// use chrono::NaiveDate;
///
/// let mut employee = EmployeeRecord::new("emp_001", "Nguyễn Văn A");
/// employee.gender = Some(Gender::Male);
/// employee.date_of_birth = NaiveDate::from_ymd_opt(1962, 3, 10);
///
/// let engine = LifecycleEngine::new(PolicyConfig::default())?;
/// let source = InMemoryRecordSource::new(vec![employee]);
/// let mut store = InMemoryDedupStore::default();
/// let mut sink = CollectingSink::default();
/// let date = NaiveDate::from_ymd_opt(2023, 9, 10).unwrap();
///
/// let first = engine.run(&source, &mut store, &mut sink, date)?;
/// assert_eq!(first.events.len(), 1);
///
/// let second = engine.run(&source, &mut store, &mut sink, date)?;
/// assert!(second.events.is_empty());
/// # Ok::<(), hr_lifecycle_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LifecycleEngine {
    policy: PolicyConfig,
}

impl LifecycleEngine {
    /// Creates an engine, failing fast if the policy is invalid.
    pub fn new(policy: PolicyConfig) -> EngineResult<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    /// The policy this engine evaluates under.
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Evaluates a snapshot without consulting or updating any dedup state.
    ///
    /// Returns every candidate in delivery order.
    pub fn preview(&self, snapshot: &RecordSnapshot, evaluation_date: NaiveDate) -> Vec<LifecycleEvent> {
        let mut events = collect_candidates(snapshot, &self.policy, evaluation_date);
        order_events(&mut events);
        events
    }

    /// Executes one batch run.
    ///
    /// The dedup store is borrowed exclusively for the whole run, so two
    /// runs can never interleave their lookups and write-backs on it.
    ///
    /// # Errors
    ///
    /// - `DataAccess` if the record source or the dedup store fails; nothing is delivered.
    /// - `SinkDelivery` if the sink rejects the batch; the dedup store is left
    ///   untouched so the same events are offered again next run.
    pub fn run(
        &self,
        source: &dyn RecordSource,
        store: &mut dyn DedupStore,
        sink: &mut dyn EventSink,
        evaluation_date: NaiveDate,
    ) -> EngineResult<RunReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start_time = Instant::now();
        let span = info_span!("lifecycle_run", run_id = %run_id, evaluation_date = %evaluation_date);
        let _entered = span.enter();

        let records = source.read_all(evaluation_date).inspect_err(|err| {
            error!(error = %err, "Failed to load record snapshot");
        })?;
        let snapshot = RecordSnapshot::capture(evaluation_date, records);
        let records_evaluated = snapshot.active().count();
        info!(
            records_read = snapshot.len(),
            records_evaluated, "Record snapshot captured"
        );

        let candidates = collect_candidates(&snapshot, &self.policy, evaluation_date);
        let candidate_count = candidates.len();

        let suppression = suppress_already_notified(candidates, &*store).inspect_err(|err| {
            error!(error = %err, "Failed to read dedup store");
        })?;
        let pruned = store.prune_before(evaluation_date).inspect_err(|err| {
            error!(error = %err, "Failed to prune dedup store");
        })?;
        let mut events = suppression.accepted;
        order_events(&mut events);
        info!(
            candidates = candidate_count,
            suppressed = suppression.suppressed,
            pruned,
            accepted = events.len(),
            "Candidates deduplicated"
        );

        if events.is_empty() {
            info!("Nothing to deliver");
        } else {
            if let Err(err) = sink.deliver(&events) {
                warn!(
                    error = %err,
                    events = events.len(),
                    "Sink rejected batch; skipping dedup write-back"
                );
                // Callers retry on SinkDelivery. Whatever the sink raised,
                // the batch was not delivered.
                return Err(match err {
                    EngineError::SinkDelivery { message } => EngineError::SinkDelivery { message },
                    other => EngineError::SinkDelivery {
                        message: other.to_string(),
                    },
                });
            }

            let delivered: Vec<_> = events
                .iter()
                .map(|event| (event.dedup_key.clone(), event.period().clone()))
                .collect();
            store.put_all(&delivered).inspect_err(|err| {
                error!(
                    error = %err,
                    events = delivered.len(),
                    "Failed to record delivered batch"
                );
            })?;
        }

        let duration_us = start_time.elapsed().as_micros() as u64;
        info!(events = events.len(), duration_us, "Lifecycle run completed");

        Ok(RunReport {
            run_id,
            started_at,
            evaluation_date,
            records_read: snapshot.len(),
            records_evaluated,
            candidates: candidate_count,
            suppressed: suppression.suppressed,
            pruned,
            events,
            duration_us,
        })
    }
}
