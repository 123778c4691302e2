//! Lifecycle event models: the engine's output.
//!
//! This module contains the [`LifecycleEvent`] type, its kind-specific
//! [`EventDetail`], the [`DedupKey`] that identifies an event within its
//! [`ReferencePeriod`], and the [`AuditStep`] explaining why it fired.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ContractType, EmployeeRecord, StaffCategory};

/// The three lifecycle concerns the engine derives events for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The employee has served the required interval since their last raise.
    SalaryRaiseDue,
    /// The employee reaches retirement age within the notice window.
    RetirementNotice,
    /// The employee's probation or fixed-term contract is about to expire.
    ContractExpiryWarning,
}

impl EventKind {
    /// Fixed ordering priority, lower sorts first.
    ///
    /// ```
    /// use hr_lifecycle_engine::models::EventKind;
    ///
    /// assert!(EventKind::RetirementNotice.priority() < EventKind::ContractExpiryWarning.priority());
    /// assert!(EventKind::ContractExpiryWarning.priority() < EventKind::SalaryRaiseDue.priority());
    /// ```
    pub fn priority(self) -> u8 {
        match self {
            EventKind::RetirementNotice => 0,
            EventKind::ContractExpiryWarning => 1,
            EventKind::SalaryRaiseDue => 2,
        }
    }

    /// The snake_case name used in dedup keys and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SalaryRaiseDue => "salary_raise_due",
            EventKind::RetirementNotice => "retirement_notice",
            EventKind::ContractExpiryWarning => "contract_expiry_warning",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "salary_raise_due" => Ok(EventKind::SalaryRaiseDue),
            "retirement_notice" => Ok(EventKind::RetirementNotice),
            "contract_expiry_warning" => Ok(EventKind::ContractExpiryWarning),
            other => Err(format!("unknown event kind '{}'", other)),
        }
    }
}

/// The period within which an event is notified at most once.
///
/// Serialized as `YYYY-MM` for month buckets and `YYYY-MM-DD` for day buckets.
///
/// # Example
///
/// ```
/// use hr_lifecycle_engine::models::ReferencePeriod;
/// use chrono::NaiveDate;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
/// assert_eq!(ReferencePeriod::month_of(date).to_string(), "2024-03");
/// assert_eq!(ReferencePeriod::day_of(date).to_string(), "2024-03-10");
/// assert_eq!("2024-03".parse::<ReferencePeriod>().unwrap(), ReferencePeriod::month_of(date));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ReferencePeriod {
    /// A calendar month.
    Month {
        /// The year.
        year: i32,
        /// The month, 1-12.
        month: u32,
    },
    /// A single day.
    Day(NaiveDate),
}

impl ReferencePeriod {
    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        ReferencePeriod::Month {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The single day `date`.
    pub fn day_of(date: NaiveDate) -> Self {
        ReferencePeriod::Day(date)
    }

    /// Returns true if the whole period lies before the period of the same
    /// granularity containing `date`.
    pub fn ends_before(&self, date: NaiveDate) -> bool {
        match self {
            ReferencePeriod::Month { year, month } => (*year, *month) < (date.year(), date.month()),
            ReferencePeriod::Day(day) => *day < date,
        }
    }
}

impl fmt::Display for ReferencePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferencePeriod::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            ReferencePeriod::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for ReferencePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(ReferencePeriod::Day(date));
        }

        let invalid = || format!("invalid reference period '{}'", s);
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(ReferencePeriod::Month { year, month })
    }
}

impl From<ReferencePeriod> for String {
    fn from(period: ReferencePeriod) -> Self {
        period.to_string()
    }
}

impl TryFrom<String> for ReferencePeriod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Stable identity of "this event, for this employee, in this period".
///
/// Rendered as `employee_id:event_kind:period`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DedupKey {
    /// The employee the event concerns.
    pub employee_id: String,
    /// The event kind.
    pub kind: EventKind,
    /// The notification period.
    pub period: ReferencePeriod,
}

impl fmt::Display for DedupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.employee_id, self.kind, self.period)
    }
}

impl FromStr for DedupKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Employee ids may themselves contain ':'.
        let mut parts = s.rsplitn(3, ':');
        let (Some(period), Some(kind), Some(employee_id)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("invalid dedup key '{}'", s));
        };

        Ok(DedupKey {
            employee_id: employee_id.to_string(),
            kind: kind.parse()?,
            period: period.parse()?,
        })
    }
}

impl From<DedupKey> for String {
    fn from(key: DedupKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for DedupKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A record of the rule decision behind an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The unique identifier of the rule that fired.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The inputs the rule read.
    pub input: serde_json::Value,
    /// The values the rule derived.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// What a due salary raise consists of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RaiseKind {
    /// Move up one salary level.
    StepIncrease {
        /// The level after the raise, when the current level is known.
        next_level: Option<i32>,
        /// The coefficient after the raise, when the current coefficient is known.
        next_coefficient: Option<Decimal>,
    },
    /// Already at the final level: a seniority allowance is granted instead.
    SeniorityAllowance {
        /// Allowance as a percent of salary.
        percent: Decimal,
    },
}

/// How pressing a retirement notice is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetirementUrgency {
    /// Retirement decision must be drafted now.
    Urgent,
    /// Notice should be sent and paperwork prepared.
    Notice,
}

/// Kind-specific payload of a [`LifecycleEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDetail {
    /// See [`EventKind::SalaryRaiseDue`].
    SalaryRaiseDue {
        /// Whole months since the last raise.
        elapsed_months: i32,
        /// Months the policy requires for this category.
        required_months: i32,
        /// The category that selected the interval.
        category: StaffCategory,
        /// The date of the last raise.
        last_raise_date: NaiveDate,
        /// What the raise consists of.
        raise: RaiseKind,
    },
    /// See [`EventKind::RetirementNotice`].
    RetirementNotice {
        /// Whole months until the retirement date.
        months_to_retirement: i32,
        /// The retirement age that applied.
        retirement_age: i32,
        /// Urgency tier.
        urgency: RetirementUrgency,
        /// Whether an early pre-retirement raise may be proposed.
        early_raise_eligible: bool,
    },
    /// See [`EventKind::ContractExpiryWarning`].
    ContractExpiryWarning {
        /// Calendar days until the contract expires.
        days_to_expiry: i64,
        /// The expiring contract's type.
        contract_type: ContractType,
    },
}

impl EventDetail {
    /// The kind of this payload.
    pub fn kind(&self) -> EventKind {
        match self {
            EventDetail::SalaryRaiseDue { .. } => EventKind::SalaryRaiseDue,
            EventDetail::RetirementNotice { .. } => EventKind::RetirementNotice,
            EventDetail::ContractExpiryWarning { .. } => EventKind::ContractExpiryWarning,
        }
    }

    /// The kind-specific quantity: elapsed months, months to retirement or days to expiry.
    pub fn quantity(&self) -> i64 {
        match self {
            EventDetail::SalaryRaiseDue { elapsed_months, .. } => i64::from(*elapsed_months),
            EventDetail::RetirementNotice {
                months_to_retirement,
                ..
            } => i64::from(*months_to_retirement),
            EventDetail::ContractExpiryWarning { days_to_expiry, .. } => *days_to_expiry,
        }
    }

    /// Sort key within a kind: lower is more urgent.
    ///
    /// Retirement and contract events are more urgent the less time is
    /// left; salary events are more urgent the longer they are overdue.
    pub fn urgency_rank(&self) -> i64 {
        match self {
            EventDetail::SalaryRaiseDue { .. } => -self.quantity(),
            _ => self.quantity(),
        }
    }
}

/// A derived fact about an employee that requires human action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// The employee's identifier.
    pub employee_id: String,
    /// The employee's full name.
    pub full_name: String,
    /// The employee's department.
    pub department: Option<String>,
    /// Next due date (salary), retirement date or contract expiry date.
    pub reference_date: NaiveDate,
    /// Kind-specific payload.
    pub detail: EventDetail,
    /// Identity used for at-most-once-per-period notification.
    pub dedup_key: DedupKey,
    /// Why the rule fired.
    pub audit: AuditStep,
}

impl LifecycleEvent {
    /// Builds an event for `employee`, deriving the dedup key from the detail's kind.
    pub fn new(
        employee: &EmployeeRecord,
        reference_date: NaiveDate,
        period: ReferencePeriod,
        detail: EventDetail,
        audit: AuditStep,
    ) -> Self {
        let dedup_key = DedupKey {
            employee_id: employee.id.clone(),
            kind: detail.kind(),
            period,
        };
        Self {
            employee_id: employee.id.clone(),
            full_name: employee.full_name.clone(),
            department: employee.department.clone(),
            reference_date,
            detail,
            dedup_key,
            audit,
        }
    }

    /// The event kind.
    pub fn kind(&self) -> EventKind {
        self.detail.kind()
    }

    /// The period this event is deduplicated within.
    pub fn period(&self) -> &ReferencePeriod {
        &self.dedup_key.period
    }
}
