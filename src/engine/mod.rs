//! The lifecycle engine: aggregation, deduplication and run orchestration.
//!
//! [`LifecycleEngine::run`] loads a snapshot through a [`RecordSource`],
//! applies every rule evaluator, filters the candidates through a
//! [`DedupStore`], orders them and hands the batch to an [`EventSink`].
//! Dedup keys are written back only once the sink has accepted the batch.

mod aggregator;
mod ports;
mod report;
mod runner;

pub use aggregator::{
    Suppression, collect_candidates, compare_events, order_events, suppress_already_notified,
};
pub use ports::{DedupStore, EventSink, RecordSource};
pub use report::RunReport;
pub use runner::LifecycleEngine;
