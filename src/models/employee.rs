//! Employee record model and related types.
//!
//! Records are owned by the persistence collaborator; the engine only ever
//! reads them through a [`RecordSnapshot`](super::RecordSnapshot).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Gender as recorded on the personnel file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
}

/// The kind of labour contract an employee holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    /// Probationary contract.
    Probation,
    /// Fixed-term contract.
    FixedTerm,
    /// Indefinite contract, never expires.
    Indefinite,
}

/// The employee's current labour contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    /// The contract type.
    pub contract_type: ContractType,
    /// The date the contract ends, if it has one.
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

/// Employment status. Only active employees are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    /// Currently working.
    #[default]
    Active,
    /// On leave (annual, unpaid, maternity, study).
    OnLeave,
    /// Already retired.
    Retired,
    /// Left the organization.
    Resigned,
    /// Moved to another organization.
    Transferred,
    /// Suspended from duty.
    Suspended,
}

/// Outcome of the most recent annual evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    /// Completed duties excellently.
    Excellent,
    /// Completed duties well.
    Good,
    /// Completed duties.
    Satisfactory,
    /// Did not complete duties.
    Unsatisfactory,
}

impl Performance {
    /// Returns true for ratings that qualify for an early raise.
    pub fn is_good_or_better(self) -> bool {
        matches!(self, Performance::Excellent | Performance::Good)
    }
}

/// Policy category deciding which salary-raise interval applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffCategory {
    /// Lowest job grade, shorter raise interval.
    Staff,
    /// Every other grade.
    Regular,
}

/// One entry of an employee's salary history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryHistoryEntry {
    /// The date this salary took effect.
    pub effective_date: NaiveDate,
    /// The salary level after the change.
    #[serde(default)]
    pub level: Option<i32>,
    /// The salary coefficient after the change.
    #[serde(default)]
    pub coefficient: Option<Decimal>,
    /// Free-text remark, e.g. a disciplinary deferral.
    #[serde(default)]
    pub note: Option<String>,
}

/// A personnel record, as read from the record source.
///
/// Every attribute a rule depends on is optional: a rule that finds its
/// inputs missing yields no event for the employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Unique identifier for the employee.
    pub id: String,
    /// Full name, also the ordering tie-breaker.
    pub full_name: String,
    /// Date of birth.
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// Gender.
    #[serde(default)]
    pub gender: Option<Gender>,
    /// Free-text position title.
    #[serde(default)]
    pub position: String,
    /// Department name.
    #[serde(default)]
    pub department: Option<String>,
    /// Explicit job-grade category; overrides title matching when present.
    #[serde(default)]
    pub staff_category: Option<StaffCategory>,
    /// Current salary coefficient.
    #[serde(default)]
    pub current_salary_coefficient: Option<Decimal>,
    /// Current salary level.
    #[serde(default)]
    pub current_salary_level: Option<i32>,
    /// The date the current salary took effect.
    #[serde(default)]
    pub current_salary_date: Option<NaiveDate>,
    /// Salary history, in any order.
    #[serde(default)]
    pub salary_history: Vec<SalaryHistoryEntry>,
    /// The date the employee joined the organization.
    #[serde(default)]
    pub organization_start_date: Option<NaiveDate>,
    /// The date social-insurance contributions started.
    #[serde(default)]
    pub social_insurance_start_date: Option<NaiveDate>,
    /// The current labour contract.
    #[serde(default)]
    pub contract: Option<Contract>,
    /// The date the employee joined the party, if a member.
    #[serde(default)]
    pub party_join_date: Option<NaiveDate>,
    /// Employment status.
    #[serde(default)]
    pub work_status: WorkStatus,
    /// Most recent annual evaluation.
    #[serde(default)]
    pub latest_performance: Option<Performance>,
}

impl EmployeeRecord {
    /// Creates a record with only identity filled in.
    ///
    /// # Examples
    ///
    /// ```
    /// use hr_lifecycle_engine::models::{EmployeeRecord, WorkStatus};
    ///
    /// let record = EmployeeRecord::new("emp_001", "Nguyễn Văn A");
    /// assert!(record.is_active());
    /// assert_eq!(record.work_status, WorkStatus::Active);
    /// ```
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            date_of_birth: None,
            gender: None,
            position: String::new(),
            department: None,
            staff_category: None,
            current_salary_coefficient: None,
            current_salary_level: None,
            current_salary_date: None,
            salary_history: Vec::new(),
            organization_start_date: None,
            social_insurance_start_date: None,
            contract: None,
            party_join_date: None,
            work_status: WorkStatus::Active,
            latest_performance: None,
        }
    }

    /// Returns true if the employee is currently working.
    pub fn is_active(&self) -> bool {
        self.work_status == WorkStatus::Active
    }

    /// The salary-history entry with the latest effective date.
    pub fn latest_salary_entry(&self) -> Option<&SalaryHistoryEntry> {
        self.salary_history.iter().max_by_key(|entry| entry.effective_date)
    }

    /// Returns the date of the most recent salary change.
    ///
    /// Uses the latest salary-history entry, falling back to the current
    /// salary date and then to the organization start date.
    pub fn last_raise_date(&self) -> Option<NaiveDate> {
        self.latest_salary_entry()
            .map(|entry| entry.effective_date)
            .or(self.current_salary_date)
            .or(self.organization_start_date)
    }
}
