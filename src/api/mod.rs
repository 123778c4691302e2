//! HTTP API for previewing lifecycle evaluations.
//!
//! The API is read-only: it evaluates the records posted to it and never
//! touches dedup state or an event sink.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::EvaluationRequest;
pub use response::{ApiError, ApiErrorResponse, EvaluationResponse};
pub use state::AppState;
