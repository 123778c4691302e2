//! In-memory collaborators, for tests and for embedding the engine.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::engine::{DedupStore, EventSink, RecordSource};
use crate::error::{EngineError, EngineResult};
use crate::models::{DedupKey, EmployeeRecord, LifecycleEvent, ReferencePeriod};

/// A record source backed by a vector.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSource {
    records: Vec<EmployeeRecord>,
}

impl InMemoryRecordSource {
    /// Creates a source serving `records`.
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for InMemoryRecordSource {
    fn read_all(&self, _as_of: NaiveDate) -> EngineResult<Vec<EmployeeRecord>> {
        Ok(self.records.clone())
    }
}

/// A dedup store backed by a hash map. Not durable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDedupStore {
    entries: HashMap<DedupKey, ReferencePeriod>,
}

impl InMemoryDedupStore {
    /// Number of recorded keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DedupStore for InMemoryDedupStore {
    fn get(&self, key: &DedupKey) -> EngineResult<Option<ReferencePeriod>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &DedupKey, period: &ReferencePeriod) -> EngineResult<()> {
        self.entries.insert(key.clone(), period.clone());
        Ok(())
    }

    fn prune_before(&mut self, evaluation_date: NaiveDate) -> EngineResult<usize> {
        let before = self.entries.len();
        self.entries
            .retain(|_, period| !period.ends_before(evaluation_date));
        Ok(before - self.entries.len())
    }
}

/// A sink that keeps every delivered batch.
///
/// It can be told to reject its next delivery, to exercise the engine's
/// failure path.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    batches: Vec<Vec<LifecycleEvent>>,
    fail_next: Option<String>,
}

impl CollectingSink {
    /// Makes the next delivery fail with `message`.
    pub fn fail_next_delivery(&mut self, message: impl Into<String>) {
        self.fail_next = Some(message.into());
    }

    /// Every accepted batch, in delivery order.
    pub fn batches(&self) -> &[Vec<LifecycleEvent>] {
        &self.batches
    }

    /// Every accepted event across all batches.
    pub fn events(&self) -> impl Iterator<Item = &LifecycleEvent> {
        self.batches.iter().flatten()
    }
}

impl EventSink for CollectingSink {
    fn deliver(&mut self, events: &[LifecycleEvent]) -> EngineResult<()> {
        if let Some(message) = self.fail_next.take() {
            return Err(EngineError::SinkDelivery { message });
        }
        self.batches.push(events.to_vec());
        Ok(())
    }
}
