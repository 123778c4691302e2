//! Immutable per-run view of the employee roster.

use std::sync::Arc;

use chrono::NaiveDate;

use super::EmployeeRecord;

/// A read-only copy of the roster, captured once at the start of a run.
///
/// The snapshot owns its records, so later writes to the underlying store
/// cannot affect an evaluation in progress. Cloning is cheap and shares
/// the same records.
///
/// # Example
///
/// ```
/// use hr_lifecycle_engine::models::{EmployeeRecord, RecordSnapshot};
/// use chrono::NaiveDate;
///
/// let as_of = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let snapshot = RecordSnapshot::capture(as_of, vec![EmployeeRecord::new("emp_001", "A")]);
/// assert_eq!(snapshot.len(), 1);
/// assert_eq!(snapshot.as_of(), as_of);
/// ```
#[derive(Debug, Clone)]
pub struct RecordSnapshot {
    as_of: NaiveDate,
    records: Arc<[EmployeeRecord]>,
}

impl RecordSnapshot {
    /// Takes ownership of `records` as the snapshot taken at `as_of`.
    pub fn capture(as_of: NaiveDate, records: Vec<EmployeeRecord>) -> Self {
        Self {
            as_of,
            records: records.into(),
        }
    }

    /// The date the snapshot was read for.
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// All records in source order.
    pub fn records(&self) -> &[EmployeeRecord] {
        &self.records
    }

    /// Iterates over the records that are in active employment.
    pub fn active(&self) -> impl Iterator<Item = &EmployeeRecord> {
        self.records.iter().filter(|record| record.is_active())
    }

    /// Number of records in the snapshot.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkStatus;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_capture_is_independent_of_source_vec() {
        let mut source = vec![EmployeeRecord::new("emp_001", "A")];
        let snapshot = RecordSnapshot::capture(as_of(), source.clone());

        source[0].full_name = "Changed".to_string();
        source.push(EmployeeRecord::new("emp_002", "B"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.records()[0].full_name, "A");
    }

    #[test]
    fn test_active_skips_inactive_records() {
        let mut retired = EmployeeRecord::new("emp_002", "B");
        retired.work_status = WorkStatus::Retired;
        let snapshot = RecordSnapshot::capture(
            as_of(),
            vec![EmployeeRecord::new("emp_001", "A"), retired],
        );

        let ids: Vec<&str> = snapshot.active().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["emp_001"]);
    }

    #[test]
    fn test_clones_share_records() {
        let snapshot = RecordSnapshot::capture(as_of(), vec![EmployeeRecord::new("emp_001", "A")]);
        let clone = snapshot.clone();
        assert!(std::ptr::eq(snapshot.records(), clone.records()));
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = RecordSnapshot::capture(as_of(), Vec::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.active().count(), 0);
    }
}
