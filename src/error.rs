//! Error types for the lifecycle rule engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every condition that aborts an evaluation run. Records that lack the
//! fields a rule needs are *not* errors: the rule simply yields no event.

use thiserror::Error;

/// The main error type for the lifecycle rule engine.
///
/// # Example
///
/// ```
/// use hr_lifecycle_engine::error::EngineError;
///
/// let error = EngineError::ConfigNotFound {
///     path: "/missing/policy.yaml".to_string(),
/// };
/// assert_eq!(error.to_string(), "Configuration file not found: /missing/policy.yaml");
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A policy threshold failed validation (non-positive, blank, unparsable override).
    #[error("Invalid policy field '{field}': {message}")]
    InvalidPolicy {
        /// The policy field that was rejected.
        field: String,
        /// Why the value was rejected.
        message: String,
    },

    /// The record source or dedup store could not be read or written.
    #[error("Data access error on {resource}: {message}")]
    DataAccess {
        /// The resource that failed (e.g. "record source", a file path).
        resource: String,
        /// A description of the failure.
        message: String,
    },

    /// The event sink rejected the batch.
    #[error("Event sink delivery failed: {message}")]
    SinkDelivery {
        /// A description of the delivery failure.
        message: String,
    },
}

impl EngineError {
    pub(crate) fn data_access(resource: impl Into<String>, message: impl ToString) -> Self {
        EngineError::DataAccess {
            resource: resource.into(),
            message: message.to_string(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
