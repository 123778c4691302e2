//! Policy configuration types.
//!
//! This module contains the strongly-typed policy structure that is
//! deserialized from `policy.yaml` and validated before any run starts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::Gender;

fn default_staff_title_keyword() -> String {
    "nhân viên".to_string()
}

fn default_raise_hold_keywords() -> Vec<String> {
    ["kỷ luật", "ky luat", "trì hoãn", "kéo dài", "keo dai", "delay"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_final_salary_level() -> i32 {
    10
}

fn default_salary_step_coefficient() -> Decimal {
    Decimal::new(34, 2)
}

fn default_seniority_base_percent() -> Decimal {
    Decimal::new(5, 0)
}

fn default_seniority_yearly_percent() -> Decimal {
    Decimal::new(1, 0)
}

fn default_retirement_urgent_months() -> i32 {
    3
}

fn default_early_raise_min_months() -> i32 {
    24
}

fn default_early_raise_window_months() -> i32 {
    6
}

/// Named thresholds that drive every rule evaluator.
///
/// A policy is an explicit value passed into each evaluator call, so two
/// policy versions can be evaluated side by side. Construct it through
/// [`PolicyConfig::validate`] (the loader does this) before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Months between raises for regular (non-staff) positions.
    pub salary_raise_regular_months: i32,
    /// Months between raises for staff positions.
    pub salary_raise_staff_months: i32,
    /// Retirement age in years for men.
    pub retirement_age_male: i32,
    /// Retirement age in years for women.
    pub retirement_age_female: i32,
    /// Lead time in months before retirement when a notice is raised.
    pub retirement_notice_months: i32,
    /// Days before a probation contract expires when a warning is raised.
    pub contract_probation_warning_days: i64,
    /// Days before a fixed-term contract expires when a warning is raised.
    pub contract_fixed_term_warning_days: i64,

    /// Title term denoting the lowest job grade ("staff").
    #[serde(default = "default_staff_title_keyword")]
    pub staff_title_keyword: String,
    /// Terms in the latest salary-history note that put the next raise on hold
    /// (disciplinary action, deferral). Matched case-insensitively.
    #[serde(default = "default_raise_hold_keywords")]
    pub raise_hold_keywords: Vec<String>,
    /// Salary level at or above which a due raise becomes a seniority allowance.
    #[serde(default = "default_final_salary_level")]
    pub final_salary_level: i32,
    /// Coefficient added by one step increase.
    #[serde(default = "default_salary_step_coefficient")]
    pub salary_step_coefficient: Decimal,
    /// Seniority allowance percent granted in the first year at the final level.
    #[serde(default = "default_seniority_base_percent")]
    pub seniority_base_percent: Decimal,
    /// Seniority allowance percent added for each further year.
    #[serde(default = "default_seniority_yearly_percent")]
    pub seniority_yearly_percent: Decimal,
    /// Retirement notices at or below this many months are urgent.
    #[serde(default = "default_retirement_urgent_months")]
    pub retirement_urgent_months: i32,
    /// Minimum months since the last raise for an early pre-retirement raise.
    #[serde(default = "default_early_raise_min_months")]
    pub early_raise_min_months: i32,
    /// Months before retirement during which an early raise may be proposed.
    #[serde(default = "default_early_raise_window_months")]
    pub early_raise_window_months: i32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            salary_raise_regular_months: 36,
            salary_raise_staff_months: 24,
            retirement_age_male: 62,
            retirement_age_female: 60,
            retirement_notice_months: 6,
            contract_probation_warning_days: 7,
            contract_fixed_term_warning_days: 30,
            staff_title_keyword: default_staff_title_keyword(),
            raise_hold_keywords: default_raise_hold_keywords(),
            final_salary_level: default_final_salary_level(),
            salary_step_coefficient: default_salary_step_coefficient(),
            seniority_base_percent: default_seniority_base_percent(),
            seniority_yearly_percent: default_seniority_yearly_percent(),
            retirement_urgent_months: default_retirement_urgent_months(),
            early_raise_min_months: default_early_raise_min_months(),
            early_raise_window_months: default_early_raise_window_months(),
        }
    }
}

impl PolicyConfig {
    /// Checks every threshold is positive and the staff keyword is not blank.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_lifecycle_engine::config::PolicyConfig;
    ///
    /// let mut policy = PolicyConfig::default();
    /// assert!(policy.validate().is_ok());
    ///
    /// policy.retirement_notice_months = 0;
    /// assert!(policy.validate().is_err());
    /// ```
    pub fn validate(&self) -> EngineResult<()> {
        let months = [
            ("salary_raise_regular_months", self.salary_raise_regular_months),
            ("salary_raise_staff_months", self.salary_raise_staff_months),
            ("retirement_age_male", self.retirement_age_male),
            ("retirement_age_female", self.retirement_age_female),
            ("retirement_notice_months", self.retirement_notice_months),
            ("final_salary_level", self.final_salary_level),
            ("retirement_urgent_months", self.retirement_urgent_months),
            ("early_raise_min_months", self.early_raise_min_months),
            ("early_raise_window_months", self.early_raise_window_months),
        ];
        for (field, value) in months {
            ensure_positive(field, i64::from(value))?;
        }

        ensure_positive(
            "contract_probation_warning_days",
            self.contract_probation_warning_days,
        )?;
        ensure_positive(
            "contract_fixed_term_warning_days",
            self.contract_fixed_term_warning_days,
        )?;

        let decimals = [
            ("salary_step_coefficient", self.salary_step_coefficient),
            ("seniority_base_percent", self.seniority_base_percent),
            ("seniority_yearly_percent", self.seniority_yearly_percent),
        ];
        for (field, value) in decimals {
            if value <= Decimal::ZERO {
                return Err(EngineError::InvalidPolicy {
                    field: field.to_string(),
                    message: format!("must be positive, got {}", value),
                });
            }
        }

        if self.staff_title_keyword.trim().is_empty() {
            return Err(EngineError::InvalidPolicy {
                field: "staff_title_keyword".to_string(),
                message: "must not be blank".to_string(),
            });
        }

        if self.raise_hold_keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(EngineError::InvalidPolicy {
                field: "raise_hold_keywords".to_string(),
                message: "must not contain blank entries".to_string(),
            });
        }

        Ok(())
    }

    /// Returns true if a salary-history note puts the next raise on hold.
    pub fn note_holds_raise(&self, note: &str) -> bool {
        let note = note.to_lowercase();
        self.raise_hold_keywords
            .iter()
            .any(|keyword| note.contains(&keyword.trim().to_lowercase()))
    }

    /// Returns the retirement age configured for a gender.
    pub fn retirement_age(&self, gender: Gender) -> i32 {
        match gender {
            Gender::Male => self.retirement_age_male,
            Gender::Female => self.retirement_age_female,
        }
    }
}

fn ensure_positive(field: &str, value: i64) -> EngineResult<()> {
    if value <= 0 {
        return Err(EngineError::InvalidPolicy {
            field: field.to_string(),
            message: format!("must be positive, got {}", value),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hold_keywords_match_case_insensitively() {
        let policy = PolicyConfig::default();
        assert!(policy.note_holds_raise("Kéo dài thời hạn nâng lương 6 tháng"));
        assert!(policy.note_holds_raise("Raise DELAYED pending review"));
        assert!(!policy.note_holds_raise("Nâng lương đúng hạn"));
    }

    #[test]
    fn test_blank_hold_keyword_is_invalid() {
        let policy = PolicyConfig {
            raise_hold_keywords: vec!["kỷ luật".to_string(), " ".to_string()],
            ..PolicyConfig::default()
        };
        assert!(matches!(
            policy.validate(),
            Err(EngineError::InvalidPolicy { field, .. }) if field == "raise_hold_keywords"
        ));
    }

    #[test]
    fn test_default_policy_is_valid() {
        assert!(PolicyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_is_rejected() {
        let policy = PolicyConfig {
            salary_raise_staff_months: 0,
            ..PolicyConfig::default()
        };

        match policy.validate() {
            Err(EngineError::InvalidPolicy { field, .. }) => {
                assert_eq!(field, "salary_raise_staff_months");
            }
            other => panic!("Expected InvalidPolicy, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_warning_days_are_rejected() {
        let policy = PolicyConfig {
            contract_fixed_term_warning_days: -5,
            ..PolicyConfig::default()
        };

        match policy.validate() {
            Err(EngineError::InvalidPolicy { field, message }) => {
                assert_eq!(field, "contract_fixed_term_warning_days");
                assert_eq!(message, "must be positive, got -5");
            }
            other => panic!("Expected InvalidPolicy, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_keyword_is_rejected() {
        let policy = PolicyConfig {
            staff_title_keyword: "   ".to_string(),
            ..PolicyConfig::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_zero_step_coefficient_is_rejected() {
        let policy = PolicyConfig {
            salary_step_coefficient: Decimal::ZERO,
            ..PolicyConfig::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_retirement_age_by_gender() {
        let policy = PolicyConfig::default();
        assert_eq!(policy.retirement_age(Gender::Male), 62);
        assert_eq!(policy.retirement_age(Gender::Female), 60);
    }

    #[test]
    fn test_optional_fields_take_defaults() {
        let yaml = r#"
salary_raise_regular_months: 36
salary_raise_staff_months: 24
retirement_age_male: 62
retirement_age_female: 60
retirement_notice_months: 6
contract_probation_warning_days: 7
contract_fixed_term_warning_days: 30
"#;
        let policy: PolicyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy, PolicyConfig::default());
    }
}
