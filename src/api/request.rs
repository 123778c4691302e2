//! Request types for the `/evaluate` endpoint.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::EmployeeRecord;

use super::response::ApiError;

/// Request body for `POST /evaluate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// The date to evaluate as "today".
    pub evaluation_date: NaiveDate,
    /// The records to evaluate.
    pub employees: Vec<EmployeeRecord>,
}

impl EvaluationRequest {
    /// Rejects blank or repeated employee ids.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut seen = HashSet::new();
        for (index, employee) in self.employees.iter().enumerate() {
            if employee.id.trim().is_empty() {
                return Err(ApiError::with_details(
                    "VALIDATION_ERROR",
                    "employee id must not be blank",
                    format!("employees[{}]", index),
                ));
            }
            if !seen.insert(employee.id.as_str()) {
                return Err(ApiError::with_details(
                    "VALIDATION_ERROR",
                    format!("duplicate employee id: {}", employee.id),
                    format!("employees[{}]", index),
                ));
            }
        }
        Ok(())
    }
}
