//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the lifecycle
//! policy from a YAML file, with optional `HR_POLICY_*` environment overrides.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

use super::types::PolicyConfig;

/// Prefix of environment variables that override individual policy fields.
pub const POLICY_ENV_PREFIX: &str = "HR_POLICY_";

/// Loads and provides access to the lifecycle policy.
///
/// # Directory Structure
///
/// ```text
/// config/
/// └── policy.yaml   # Lifecycle thresholds
/// ```
///
/// # Example
///
/// ```no_run
/// use hr_lifecycle_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config")?;
/// println!("Staff raise interval: {} months", loader.policy().salary_raise_staff_months);
/// # Ok::<(), hr_lifecycle_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    policy: PolicyConfig,
}

impl ConfigLoader {
    /// Loads and validates `policy.yaml` from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - `policy.yaml` is missing (`ConfigNotFound`)
    /// - the file is not valid YAML or lacks a required threshold (`ConfigParseError`)
    /// - any threshold is non-positive (`InvalidPolicy`)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Self::load_with_overrides(path, std::iter::empty::<(String, String)>())
    }

    /// Loads `policy.yaml` and applies overrides from the process environment.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Self::load_with_overrides(path, std::env::vars())
    }

    /// Loads `policy.yaml` and applies `HR_POLICY_<FIELD>` overrides from `vars`.
    ///
    /// Variables without the prefix are ignored. Validation runs after the
    /// overrides, so an override cannot smuggle in a non-positive threshold.
    pub fn load_with_overrides<P, I>(path: P, vars: I) -> EngineResult<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = (String, String)>,
    {
        let policy_path = path.as_ref().join("policy.yaml");
        let mut policy = Self::load_yaml(&policy_path)?;

        for (key, value) in vars {
            if let Some(field) = key.strip_prefix(POLICY_ENV_PREFIX) {
                apply_override(&mut policy, &field.to_ascii_lowercase(), &value)?;
                debug!(field = %field.to_ascii_lowercase(), "Applied policy override");
            }
        }

        Self::from_policy(policy)
    }

    /// Wraps an already-built policy, validating it first.
    pub fn from_policy(policy: PolicyConfig) -> EngineResult<Self> {
        policy.validate()?;
        info!(
            salary_raise_regular_months = policy.salary_raise_regular_months,
            salary_raise_staff_months = policy.salary_raise_staff_months,
            retirement_notice_months = policy.retirement_notice_months,
            "Policy configuration loaded"
        );
        Ok(Self { policy })
    }

    fn load_yaml(path: &Path) -> EngineResult<PolicyConfig> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the validated policy.
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Consumes the loader, returning the validated policy.
    pub fn into_policy(self) -> PolicyConfig {
        self.policy
    }
}

fn apply_override(policy: &mut PolicyConfig, field: &str, value: &str) -> EngineResult<()> {
    match field {
        "salary_raise_regular_months" => {
            policy.salary_raise_regular_months = parse_field(field, value)?
        }
        "salary_raise_staff_months" => policy.salary_raise_staff_months = parse_field(field, value)?,
        "retirement_age_male" => policy.retirement_age_male = parse_field(field, value)?,
        "retirement_age_female" => policy.retirement_age_female = parse_field(field, value)?,
        "retirement_notice_months" => policy.retirement_notice_months = parse_field(field, value)?,
        "contract_probation_warning_days" => {
            policy.contract_probation_warning_days = parse_field(field, value)?
        }
        "contract_fixed_term_warning_days" => {
            policy.contract_fixed_term_warning_days = parse_field(field, value)?
        }
        "staff_title_keyword" => policy.staff_title_keyword = value.to_string(),
        "raise_hold_keywords" => {
            policy.raise_hold_keywords = value.split(',').map(|k| k.trim().to_string()).collect()
        }
        "final_salary_level" => policy.final_salary_level = parse_field(field, value)?,
        "salary_step_coefficient" => {
            policy.salary_step_coefficient = parse_field::<Decimal>(field, value)?
        }
        "seniority_base_percent" => {
            policy.seniority_base_percent = parse_field::<Decimal>(field, value)?
        }
        "seniority_yearly_percent" => {
            policy.seniority_yearly_percent = parse_field::<Decimal>(field, value)?
        }
        "retirement_urgent_months" => policy.retirement_urgent_months = parse_field(field, value)?,
        "early_raise_min_months" => policy.early_raise_min_months = parse_field(field, value)?,
        "early_raise_window_months" => {
            policy.early_raise_window_months = parse_field(field, value)?
        }
        _ => {
            return Err(EngineError::InvalidPolicy {
                field: field.to_string(),
                message: "unknown policy field".to_string(),
            });
        }
    }
    Ok(())
}

fn parse_field<T>(field: &str, value: &str) -> EngineResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| EngineError::InvalidPolicy {
        field: field.to_string(),
        message: format!("cannot parse '{}': {}", value, e),
    })
}
