//! Candidate aggregation, deduplication and ordering.
//!
//! This module turns the per-employee candidates of every rule evaluator
//! into the final batch: it drops inactive employees, suppresses events
//! already notified in their reference period and sorts the remainder
//! into a deterministic order.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::config::PolicyConfig;
use crate::error::EngineResult;
use crate::models::{LifecycleEvent, RecordSnapshot};
use crate::rules::evaluate_employee;

use super::ports::DedupStore;

/// The outcome of checking candidates against the dedup store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    /// Candidates not yet notified in their period.
    pub accepted: Vec<LifecycleEvent>,
    /// How many candidates were dropped as already notified.
    pub suppressed: usize,
}

/// Applies every evaluator to every active employee in the snapshot.
///
/// Inactive employees are skipped. If the same dedup key is produced twice
/// (a record id repeated in the snapshot) only the first is kept.
pub fn collect_candidates(
    snapshot: &RecordSnapshot,
    policy: &PolicyConfig,
    evaluation_date: NaiveDate,
) -> Vec<LifecycleEvent> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for employee in snapshot.records() {
        if !employee.is_active() {
            trace!(
                employee_id = %employee.id,
                work_status = ?employee.work_status,
                "Skipping inactive employee"
            );
            continue;
        }

        for event in evaluate_employee(employee, policy, evaluation_date) {
            if seen.insert(event.dedup_key.clone()) {
                candidates.push(event);
            } else {
                debug!(dedup_key = %event.dedup_key, "Dropping duplicate candidate");
            }
        }
    }

    candidates
}

/// Drops candidates whose key the store already holds for the same period.
///
/// Returns a `DataAccess` error if the store cannot be read; in that case
/// no partial result is produced.
pub fn suppress_already_notified(
    candidates: Vec<LifecycleEvent>,
    store: &dyn DedupStore,
) -> EngineResult<Suppression> {
    let mut accepted = Vec::with_capacity(candidates.len());
    let mut suppressed = 0;

    for event in candidates {
        let already_notified = store
            .get(&event.dedup_key)?
            .is_some_and(|period| &period == event.period());

        if already_notified {
            trace!(dedup_key = %event.dedup_key, "Suppressing already notified event");
            suppressed += 1;
        } else {
            accepted.push(event);
        }
    }

    Ok(Suppression {
        accepted,
        suppressed,
    })
}

/// Total order over events.
///
/// Kind priority first (retirement, contract, salary), then urgency (least
/// time left, or most overdue, first), then full name, then employee id.
pub fn compare_events(a: &LifecycleEvent, b: &LifecycleEvent) -> Ordering {
    a.kind()
        .priority()
        .cmp(&b.kind().priority())
        .then_with(|| a.detail.urgency_rank().cmp(&b.detail.urgency_rank()))
        .then_with(|| a.full_name.cmp(&b.full_name))
        .then_with(|| a.employee_id.cmp(&b.employee_id))
}

/// Sorts events into delivery order.
pub fn order_events(events: &mut [LifecycleEvent]) {
    events.sort_by(compare_events);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmployeeRecord, EventDetail, EventKind, Gender, WorkStatus};
    use crate::store::InMemoryDedupStore;
    use crate::engine::DedupStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn salary_due(id: &str, name: &str, salary_date: NaiveDate) -> EmployeeRecord {
        let mut employee = EmployeeRecord::new(id, name);
        employee.position = "Chuyên viên".to_string();
        employee.current_salary_date = Some(salary_date);
        employee
    }

    fn retiring(id: &str, name: &str) -> EmployeeRecord {
        let mut employee = EmployeeRecord::new(id, name);
        employee.gender = Some(Gender::Male);
        employee.date_of_birth = Some(date(1962, 3, 10));
        employee
    }

    fn eval_date() -> NaiveDate {
        date(2023, 9, 10)
    }

    #[test]
    fn test_collect_skips_inactive_employees() {
        let mut resigned = salary_due("emp_002", "B", date(2018, 1, 1));
        resigned.work_status = WorkStatus::Resigned;
        let snapshot = RecordSnapshot::capture(
            eval_date(),
            vec![salary_due("emp_001", "A", date(2018, 1, 1)), resigned],
        );

        let candidates = collect_candidates(&snapshot, &PolicyConfig::default(), eval_date());

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].employee_id, "emp_001");
    }

    #[test]
    fn test_collect_drops_duplicate_keys() {
        let snapshot = RecordSnapshot::capture(
            eval_date(),
            vec![
                salary_due("emp_001", "A", date(2018, 1, 1)),
                salary_due("emp_001", "A (copy)", date(2018, 1, 1)),
            ],
        );

        let candidates = collect_candidates(&snapshot, &PolicyConfig::default(), eval_date());

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].full_name, "A");
    }

    #[test]
    fn test_more_overdue_salary_sorts_first() {
        // 40 and 50 months elapsed on 2023-09-10
        let snapshot = RecordSnapshot::capture(
            eval_date(),
            vec![
                salary_due("emp_040", "An", date(2020, 5, 1)),
                salary_due("emp_050", "Bình", date(2019, 7, 1)),
            ],
        );

        let mut events = collect_candidates(&snapshot, &PolicyConfig::default(), eval_date());
        order_events(&mut events);

        let elapsed: Vec<i64> = events.iter().map(|e| e.detail.quantity()).collect();
        assert_eq!(elapsed, vec![50, 40]);
    }

    #[test]
    fn test_retirement_sorts_before_any_salary_event() {
        let snapshot = RecordSnapshot::capture(
            eval_date(),
            vec![
                salary_due("emp_001", "An", date(2000, 1, 1)),
                retiring("emp_002", "Zung"),
            ],
        );

        let mut events = collect_candidates(&snapshot, &PolicyConfig::default(), eval_date());
        order_events(&mut events);

        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![EventKind::RetirementNotice, EventKind::SalaryRaiseDue]
        );
    }

    #[test]
    fn test_ties_break_on_full_name() {
        let snapshot = RecordSnapshot::capture(
            eval_date(),
            vec![retiring("emp_001", "Trần Văn B"), retiring("emp_002", "Lê Văn A")],
        );

        let mut events = collect_candidates(&snapshot, &PolicyConfig::default(), eval_date());
        order_events(&mut events);

        let names: Vec<&str> = events.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(names, vec!["Lê Văn A", "Trần Văn B"]);
    }

    #[test]
    fn test_suppression_uses_stored_period() {
        let snapshot =
            RecordSnapshot::capture(eval_date(), vec![retiring("emp_001", "Nguyễn Văn A")]);
        let candidates = collect_candidates(&snapshot, &PolicyConfig::default(), eval_date());
        let key = candidates[0].dedup_key.clone();

        let mut store = InMemoryDedupStore::default();
        let first = suppress_already_notified(candidates.clone(), &store).unwrap();
        assert_eq!(first.accepted.len(), 1);
        assert_eq!(first.suppressed, 0);

        store.put(&key, &key.period).unwrap();
        let second = suppress_already_notified(candidates, &store).unwrap();
        assert!(second.accepted.is_empty());
        assert_eq!(second.suppressed, 1);
    }

    #[test]
    fn test_next_month_is_offered_again() {
        let policy = PolicyConfig::default();
        let snapshot =
            RecordSnapshot::capture(eval_date(), vec![retiring("emp_001", "Nguyễn Văn A")]);
        let mut store = InMemoryDedupStore::default();
        for event in collect_candidates(&snapshot, &policy, eval_date()) {
            store.put(&event.dedup_key, event.period()).unwrap();
        }

        let next_month = collect_candidates(&snapshot, &policy, date(2023, 10, 10));
        let outcome = suppress_already_notified(next_month, &store).unwrap();

        assert_eq!(outcome.accepted.len(), 1);
        assert!(matches!(
            outcome.accepted[0].detail,
            EventDetail::RetirementNotice {
                months_to_retirement: 5,
                ..
            }
        ));
    }
}
