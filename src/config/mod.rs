//! Policy configuration for the lifecycle rule engine.
//!
//! This module loads the policy thresholds from YAML, applies environment
//! overrides and validates that every threshold is positive.
//!
//! # Example
//!
//! ```no_run
//! use hr_lifecycle_engine::config::ConfigLoader;
//!
//! let policy = ConfigLoader::load("./config").unwrap().into_policy();
//! println!("Male retirement age: {}", policy.retirement_age_male);
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, POLICY_ENV_PREFIX};
pub use types::PolicyConfig;
