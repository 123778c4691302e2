//! HR compliance and lifecycle rule engine.
//!
//! This crate evaluates employee records against a lifecycle policy and
//! emits time-sensitive events: salary raises falling due, upcoming
//! retirements and expiring labour contracts. Events are deduplicated so
//! each is notified at most once per reference period.

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod rules;
pub mod store;
