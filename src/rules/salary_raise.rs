//! Salary-raise eligibility.
//!
//! An employee becomes due for a raise once the whole calendar months since
//! their last raise reach the interval their staff category requires.
//! Employees already at the final salary level receive a seniority
//! allowance instead of a step increase.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::PolicyConfig;
use crate::models::{
    AuditStep, EmployeeRecord, EventDetail, LifecycleEvent, RaiseKind, ReferencePeriod,
};

use super::calendar::{add_months, months_between};
use super::category::{classify_category, required_raise_months};

/// Rule identifier recorded on salary-raise audit steps.
pub const SALARY_RAISE_RULE_ID: &str = "salary_raise_due";

/// Evaluates whether `employee` is due a salary raise on `evaluation_date`.
///
/// Returns `None` when no last-raise date can be determined (no salary
/// history, current salary date or start date) or when the elapsed months
/// are still below the required interval.
///
/// The event's reference date is the date the raise fell due, and its
/// dedup period is the evaluation month.
///
/// # Examples
///
/// ```
/// use hr_lifecycle_engine::config::PolicyConfig;
/// use hr_lifecycle_engine::models::{EmployeeRecord, EventDetail};
/// use hr_lifecycle_engine::rules::evaluate_salary_raise;
/// use chrono::NaiveDate;
///
/// let policy = PolicyConfig::default();
/// let mut employee = EmployeeRecord::new("emp_001", "A");
/// employee.position = "Chuyên viên".to_string();
/// employee.current_salary_date = NaiveDate::from_ymd_opt(2021, 3, 15);
///
/// let eval = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let event = evaluate_salary_raise(&employee, &policy, eval).unwrap();
/// assert!(matches!(event.detail, EventDetail::SalaryRaiseDue { elapsed_months: 36, .. }));
/// ```
pub fn evaluate_salary_raise(
    employee: &EmployeeRecord,
    policy: &PolicyConfig,
    evaluation_date: NaiveDate,
) -> Option<LifecycleEvent> {
    let on_hold = employee
        .latest_salary_entry()
        .and_then(|entry| entry.note.as_deref())
        .is_some_and(|note| policy.note_holds_raise(note));
    if on_hold {
        return None;
    }

    let last_raise_date = employee.last_raise_date()?;
    let category = classify_category(employee, policy);
    let required_months = required_raise_months(category, policy);
    let elapsed_months = months_between(last_raise_date, evaluation_date);

    if elapsed_months < required_months {
        return None;
    }

    let due_date = add_months(last_raise_date, required_months)?;
    let raise = raise_kind(employee, policy, elapsed_months);

    let reasoning = match &raise {
        RaiseKind::StepIncrease { .. } => format!(
            "{} months since last raise on {} meets the {}-month {:?} interval",
            elapsed_months, last_raise_date, required_months, category
        ),
        RaiseKind::SeniorityAllowance { percent } => format!(
            "{} months since last raise on {} at final level; seniority allowance {}%",
            elapsed_months, last_raise_date, percent
        ),
    };

    let audit = AuditStep {
        rule_id: SALARY_RAISE_RULE_ID.to_string(),
        rule_name: "Salary Raise Eligibility".to_string(),
        input: serde_json::json!({
            "position": employee.position,
            "last_raise_date": last_raise_date.to_string(),
            "current_salary_level": employee.current_salary_level,
            "current_salary_coefficient": employee.current_salary_coefficient.map(|c| c.to_string()),
            "evaluation_date": evaluation_date.to_string()
        }),
        output: serde_json::json!({
            "category": category,
            "required_months": required_months,
            "elapsed_months": elapsed_months,
            "due_date": due_date.to_string(),
            "raise": raise
        }),
        reasoning,
    };

    Some(LifecycleEvent::new(
        employee,
        due_date,
        ReferencePeriod::month_of(evaluation_date),
        EventDetail::SalaryRaiseDue {
            elapsed_months,
            required_months,
            category,
            last_raise_date,
            raise,
        },
        audit,
    ))
}

fn raise_kind(employee: &EmployeeRecord, policy: &PolicyConfig, elapsed_months: i32) -> RaiseKind {
    match employee.current_salary_level {
        Some(level) if level >= policy.final_salary_level => {
            let years = (elapsed_months / 12).max(1);
            let percent = policy.seniority_base_percent
                + Decimal::from(years - 1) * policy.seniority_yearly_percent;
            RaiseKind::SeniorityAllowance { percent }
        }
        level => RaiseKind::StepIncrease {
            next_level: level.map(|l| l + 1),
            next_coefficient: employee
                .current_salary_coefficient
                .map(|c| c + policy.salary_step_coefficient),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, SalaryHistoryEntry, StaffCategory};
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_employee(position: &str, salary_date: NaiveDate) -> EmployeeRecord {
        let mut employee = EmployeeRecord::new("emp_001", "Nguyễn Văn A");
        employee.position = position.to_string();
        employee.current_salary_date = Some(salary_date);
        employee.current_salary_level = Some(3);
        employee.current_salary_coefficient = Some(dec("3.00"));
        employee
    }

    fn eval_date() -> NaiveDate {
        date(2024, 6, 15)
    }

    #[test]
    fn test_regular_fires_exactly_at_required_months() {
        let policy = PolicyConfig::default();
        let employee = create_test_employee("Chuyên viên", date(2021, 6, 15));

        let event = evaluate_salary_raise(&employee, &policy, eval_date()).unwrap();

        assert_eq!(event.kind(), EventKind::SalaryRaiseDue);
        assert_eq!(event.reference_date, date(2024, 6, 15));
        match event.detail {
            EventDetail::SalaryRaiseDue {
                elapsed_months,
                required_months,
                category,
                ..
            } => {
                assert_eq!(elapsed_months, 36);
                assert_eq!(required_months, 36);
                assert_eq!(category, StaffCategory::Regular);
            }
            other => panic!("Unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_regular_one_month_short_does_not_fire() {
        let policy = PolicyConfig::default();
        let employee = create_test_employee("Chuyên viên", date(2021, 7, 1));

        assert!(evaluate_salary_raise(&employee, &policy, eval_date()).is_none());
    }

    #[test]
    fn test_staff_uses_shorter_interval() {
        let policy = PolicyConfig::default();
        let staff = create_test_employee("Nhân viên lái xe", date(2022, 6, 30));
        let regular = create_test_employee("Chuyên viên", date(2022, 6, 30));

        assert!(evaluate_salary_raise(&staff, &policy, eval_date()).is_some());
        assert!(evaluate_salary_raise(&regular, &policy, eval_date()).is_none());

        let staff_short = create_test_employee("Nhân viên lái xe", date(2022, 7, 1));
        assert!(evaluate_salary_raise(&staff_short, &policy, eval_date()).is_none());
    }

    #[test]
    fn test_day_of_month_is_ignored() {
        let policy = PolicyConfig::default();
        let late_in_month = create_test_employee("Chuyên viên", date(2021, 6, 30));

        let event = evaluate_salary_raise(&late_in_month, &policy, date(2024, 6, 1)).unwrap();
        assert_eq!(event.detail.quantity(), 36);
    }

    #[test]
    fn test_step_increase_computes_next_level_and_coefficient() {
        let policy = PolicyConfig::default();
        let employee = create_test_employee("Chuyên viên", date(2020, 1, 1));

        let event = evaluate_salary_raise(&employee, &policy, eval_date()).unwrap();
        match event.detail {
            EventDetail::SalaryRaiseDue { raise, .. } => {
                assert_eq!(
                    raise,
                    RaiseKind::StepIncrease {
                        next_level: Some(4),
                        next_coefficient: Some(dec("3.34")),
                    }
                );
            }
            other => panic!("Unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_final_level_gets_seniority_allowance() {
        let policy = PolicyConfig::default();
        let mut employee = create_test_employee("Chuyên viên", date(2020, 6, 1));
        employee.current_salary_level = Some(10);

        // 48 months elapsed: 4 whole years -> 5% + 3 * 1%
        let event = evaluate_salary_raise(&employee, &policy, eval_date()).unwrap();
        match event.detail {
            EventDetail::SalaryRaiseDue { raise, .. } => {
                assert_eq!(raise, RaiseKind::SeniorityAllowance { percent: dec("8") });
            }
            other => panic!("Unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_salary_history_takes_precedence() {
        let policy = PolicyConfig::default();
        let mut employee = create_test_employee("Chuyên viên", date(2019, 1, 1));
        employee.salary_history.push(SalaryHistoryEntry {
            effective_date: date(2023, 1, 1),
            level: Some(4),
            coefficient: None,
            note: None,
        });

        assert!(evaluate_salary_raise(&employee, &policy, eval_date()).is_none());
    }

    #[test]
    fn test_raise_on_hold_after_disciplinary_note() {
        let policy = PolicyConfig::default();
        let mut employee = create_test_employee("Chuyên viên", date(2019, 1, 1));
        employee.salary_history = vec![
            SalaryHistoryEntry {
                effective_date: date(2020, 1, 1),
                level: Some(3),
                coefficient: None,
                note: Some("Kéo dài 6 tháng do kỷ luật khiển trách".to_string()),
            },
        ];

        assert!(evaluate_salary_raise(&employee, &policy, eval_date()).is_none());
    }

    #[test]
    fn test_only_latest_note_holds_raise() {
        let policy = PolicyConfig::default();
        let mut employee = create_test_employee("Chuyên viên", date(2019, 1, 1));
        employee.salary_history = vec![
            SalaryHistoryEntry {
                effective_date: date(2017, 1, 1),
                level: Some(2),
                coefficient: None,
                note: Some("delay".to_string()),
            },
            SalaryHistoryEntry {
                effective_date: date(2020, 1, 1),
                level: Some(3),
                coefficient: None,
                note: Some("Nâng bậc đúng hạn".to_string()),
            },
        ];

        assert!(evaluate_salary_raise(&employee, &policy, eval_date()).is_some());
    }

    #[test]
    fn test_missing_dates_yield_no_event() {
        let policy = PolicyConfig::default();
        let employee = EmployeeRecord::new("emp_001", "A");

        assert!(evaluate_salary_raise(&employee, &policy, eval_date()).is_none());
    }

    #[test]
    fn test_start_date_fallback() {
        let policy = PolicyConfig::default();
        let mut employee = EmployeeRecord::new("emp_001", "A");
        employee.organization_start_date = Some(date(2018, 1, 1));

        let event = evaluate_salary_raise(&employee, &policy, eval_date()).unwrap();
        match event.detail {
            EventDetail::SalaryRaiseDue {
                last_raise_date,
                raise,
                ..
            } => {
                assert_eq!(last_raise_date, date(2018, 1, 1));
                assert_eq!(
                    raise,
                    RaiseKind::StepIncrease {
                        next_level: None,
                        next_coefficient: None,
                    }
                );
            }
            other => panic!("Unexpected detail {:?}", other),
        }
    }

    #[test]
    fn test_event_is_bucketed_by_evaluation_month() {
        let policy = PolicyConfig::default();
        let employee = create_test_employee("Chuyên viên", date(2020, 1, 1));

        let event = evaluate_salary_raise(&employee, &policy, eval_date()).unwrap();
        assert_eq!(event.dedup_key.to_string(), "emp_001:salary_raise_due:2024-06");
        assert_eq!(event.audit.rule_id, SALARY_RAISE_RULE_ID);
        assert_eq!(event.audit.output["elapsed_months"], 53);
    }
}
