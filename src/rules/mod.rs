//! Rule evaluators for the lifecycle engine.
//!
//! Each evaluator is a pure, total function of (employee, policy, evaluation
//! date) returning zero or one [`LifecycleEvent`]. Evaluators never fail on
//! business data: a record missing the fields a rule needs simply yields no
//! event. Shared calendar arithmetic and staff-category classification live
//! alongside them.

mod calendar;
mod category;
mod contract_expiry;
mod retirement;
mod salary_raise;

use chrono::NaiveDate;

use crate::config::PolicyConfig;
use crate::models::{EmployeeRecord, LifecycleEvent};

pub use calendar::{add_months, add_years, days_between, months_between};
pub use category::{classify_category, required_raise_months};
pub use contract_expiry::{CONTRACT_EXPIRY_RULE_ID, evaluate_contract_expiry, warning_window_days};
pub use retirement::{RETIREMENT_RULE_ID, evaluate_retirement, retirement_date};
pub use salary_raise::{SALARY_RAISE_RULE_ID, evaluate_salary_raise};

/// Signature shared by every rule evaluator.
pub type RuleEvaluator = fn(&EmployeeRecord, &PolicyConfig, NaiveDate) -> Option<LifecycleEvent>;

/// All evaluators, applied to every employee on each run.
pub const EVALUATORS: [RuleEvaluator; 3] = [
    evaluate_salary_raise,
    evaluate_retirement,
    evaluate_contract_expiry,
];

/// Applies every evaluator to one employee, returning the candidates that fired.
pub fn evaluate_employee(
    employee: &EmployeeRecord,
    policy: &PolicyConfig,
    evaluation_date: NaiveDate,
) -> Vec<LifecycleEvent> {
    EVALUATORS
        .iter()
        .filter_map(|evaluate| evaluate(employee, policy, evaluation_date))
        .collect()
}
