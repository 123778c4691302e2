//! Contract expiry warnings for probation and fixed-term contracts.

use chrono::NaiveDate;

use crate::config::PolicyConfig;
use crate::models::{
    AuditStep, ContractType, EmployeeRecord, EventDetail, LifecycleEvent, ReferencePeriod,
};

use super::calendar::days_between;

/// Rule identifier recorded on contract-expiry audit steps.
pub const CONTRACT_EXPIRY_RULE_ID: &str = "contract_expiry_warning";

/// The warning window in days for a contract type; `None` for indefinite contracts.
pub fn warning_window_days(contract_type: ContractType, policy: &PolicyConfig) -> Option<i64> {
    match contract_type {
        ContractType::Probation => Some(policy.contract_probation_warning_days),
        ContractType::FixedTerm => Some(policy.contract_fixed_term_warning_days),
        ContractType::Indefinite => None,
    }
}

/// Evaluates whether the employee's contract is about to expire.
///
/// Fires when `0 < days_to_expiry <= window` for probation and fixed-term
/// contracts that carry an expiry date. Indefinite contracts never fire.
/// Events are deduplicated per evaluation day.
pub fn evaluate_contract_expiry(
    employee: &EmployeeRecord,
    policy: &PolicyConfig,
    evaluation_date: NaiveDate,
) -> Option<LifecycleEvent> {
    let contract = employee.contract.as_ref()?;
    let window_days = warning_window_days(contract.contract_type, policy)?;
    let expiry_date = contract.expiry_date?;
    let days_to_expiry = days_between(evaluation_date, expiry_date);

    if days_to_expiry <= 0 || days_to_expiry > window_days {
        return None;
    }

    let audit = AuditStep {
        rule_id: CONTRACT_EXPIRY_RULE_ID.to_string(),
        rule_name: "Contract Expiry Warning".to_string(),
        input: serde_json::json!({
            "contract_type": contract.contract_type,
            "expiry_date": expiry_date.to_string(),
            "warning_days": window_days,
            "evaluation_date": evaluation_date.to_string()
        }),
        output: serde_json::json!({
            "days_to_expiry": days_to_expiry
        }),
        reasoning: format!(
            "{:?} contract expires on {}, {} days away (warning window {} days)",
            contract.contract_type, expiry_date, days_to_expiry, window_days
        ),
    };

    Some(LifecycleEvent::new(
        employee,
        expiry_date,
        ReferencePeriod::day_of(evaluation_date),
        EventDetail::ContractExpiryWarning {
            days_to_expiry,
            contract_type: contract.contract_type,
        },
        audit,
    ))
}
