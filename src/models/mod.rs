//! Core data models for the lifecycle rule engine.
//!
//! This module contains the employee record the rules read, the per-run
//! snapshot that holds them, and the lifecycle events the rules produce.

mod employee;
mod event;
mod snapshot;

pub use employee::{
    Contract, ContractType, EmployeeRecord, Gender, Performance, SalaryHistoryEntry,
    StaffCategory, WorkStatus,
};
pub use event::{
    AuditStep, DedupKey, EventDetail, EventKind, LifecycleEvent, RaiseKind, ReferencePeriod,
    RetirementUrgency,
};
pub use snapshot::RecordSnapshot;
