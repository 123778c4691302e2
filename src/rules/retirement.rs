//! Retirement scheduling.
//!
//! The retirement date is the date of birth shifted by the gender-specific
//! retirement age. A notice fires while the whole months left until that
//! date are strictly positive and within the configured notice window.

use chrono::NaiveDate;

use crate::config::PolicyConfig;
use crate::models::{
    AuditStep, EmployeeRecord, EventDetail, LifecycleEvent, ReferencePeriod, RetirementUrgency,
};

use super::calendar::{add_years, months_between};

/// Rule identifier recorded on retirement audit steps.
pub const RETIREMENT_RULE_ID: &str = "retirement_notice";

/// Computes the date `employee` reaches retirement age under `policy`.
///
/// Returns `None` when date of birth or gender is missing.
pub fn retirement_date(employee: &EmployeeRecord, policy: &PolicyConfig) -> Option<NaiveDate> {
    let date_of_birth = employee.date_of_birth?;
    let gender = employee.gender?;
    add_years(date_of_birth, policy.retirement_age(gender))
}

/// Evaluates whether a retirement notice is due for `employee`.
///
/// Fires when `0 < months_to_retirement <= retirement_notice_months`. The
/// reference date is the retirement date itself, for document generation.
///
/// # Examples
///
/// ```
/// use hr_lifecycle_engine::config::PolicyConfig;
/// use hr_lifecycle_engine::models::{EmployeeRecord, Gender};
/// use hr_lifecycle_engine::rules::evaluate_retirement;
/// use chrono::NaiveDate;
///
/// let policy = PolicyConfig::default();
/// let mut employee = EmployeeRecord::new("emp_001", "Nguyễn Văn A");
/// employee.gender = Some(Gender::Male);
/// employee.date_of_birth = NaiveDate::from_ymd_opt(1962, 3, 10);
///
/// let on_the_day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// assert!(evaluate_retirement(&employee, &policy, on_the_day).is_none());
///
/// let six_months_before = NaiveDate::from_ymd_opt(2023, 9, 10).unwrap();
/// assert!(evaluate_retirement(&employee, &policy, six_months_before).is_some());
/// ```
pub fn evaluate_retirement(
    employee: &EmployeeRecord,
    policy: &PolicyConfig,
    evaluation_date: NaiveDate,
) -> Option<LifecycleEvent> {
    let gender = employee.gender?;
    let retirement_age = policy.retirement_age(gender);
    let retirement_date = retirement_date(employee, policy)?;
    let months_to_retirement = months_between(evaluation_date, retirement_date);

    if months_to_retirement <= 0 || months_to_retirement > policy.retirement_notice_months {
        return None;
    }

    let urgency = if months_to_retirement <= policy.retirement_urgent_months {
        RetirementUrgency::Urgent
    } else {
        RetirementUrgency::Notice
    };
    let early_raise_eligible =
        early_raise_eligible(employee, policy, evaluation_date, months_to_retirement);

    let audit = AuditStep {
        rule_id: RETIREMENT_RULE_ID.to_string(),
        rule_name: "Retirement Notice".to_string(),
        input: serde_json::json!({
            "date_of_birth": employee.date_of_birth.map(|d| d.to_string()),
            "gender": gender,
            "retirement_age": retirement_age,
            "notice_months": policy.retirement_notice_months,
            "evaluation_date": evaluation_date.to_string()
        }),
        output: serde_json::json!({
            "retirement_date": retirement_date.to_string(),
            "months_to_retirement": months_to_retirement,
            "urgency": urgency,
            "early_raise_eligible": early_raise_eligible
        }),
        reasoning: format!(
            "Reaches retirement age {} on {}, {} months away (notice window {} months)",
            retirement_age, retirement_date, months_to_retirement, policy.retirement_notice_months
        ),
    };

    Some(LifecycleEvent::new(
        employee,
        retirement_date,
        ReferencePeriod::month_of(evaluation_date),
        EventDetail::RetirementNotice {
            months_to_retirement,
            retirement_age,
            urgency,
            early_raise_eligible,
        },
        audit,
    ))
}

/// An early raise may be proposed for someone retiring within the window
/// whose last raise is old enough and whose latest evaluation is good or better.
fn early_raise_eligible(
    employee: &EmployeeRecord,
    policy: &PolicyConfig,
    evaluation_date: NaiveDate,
    months_to_retirement: i32,
) -> bool {
    if months_to_retirement > policy.early_raise_window_months {
        return false;
    }

    let served_long_enough = employee
        .last_raise_date()
        .is_some_and(|last| months_between(last, evaluation_date) >= policy.early_raise_min_months);
    let performed_well = employee
        .latest_performance
        .is_some_and(|performance| performance.is_good_or_better());

    served_long_enough && performed_well
}
