//! HTTP request handlers for the lifecycle preview API.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::RecordSnapshot;

use super::request::EvaluationRequest;
use super::response::{ApiError, ApiErrorResponse, EvaluationResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/evaluate", post(evaluate_handler))
        .route("/policy", get(policy_handler))
        .with_state(state)
}

/// Handler for POST /evaluate.
///
/// Runs every rule over the posted records and returns the ordered
/// candidates. No dedup state is read or written.
async fn evaluate_handler(
    State(state): State<AppState>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> impl IntoResponse {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing evaluation request");

    let request = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    ApiError::validation_error(body_text)
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return ApiErrorResponse::bad_request(error).into_response();
        }
    };

    if let Err(error) = request.validate() {
        warn!(
            correlation_id = %correlation_id,
            error = %error.message,
            "Request validation failed"
        );
        return ApiErrorResponse::bad_request(error).into_response();
    }

    let start_time = Instant::now();
    let evaluation_date = request.evaluation_date;
    let snapshot = RecordSnapshot::capture(evaluation_date, request.employees);
    let events = state.engine().preview(&snapshot, evaluation_date);

    info!(
        correlation_id = %correlation_id,
        %evaluation_date,
        employees = snapshot.len(),
        events = events.len(),
        duration_us = start_time.elapsed().as_micros(),
        "Evaluation completed"
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        Json(EvaluationResponse {
            evaluation_date,
            events,
        }),
    )
        .into_response()
}

/// Handler for GET /policy.
async fn policy_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine().policy().clone())
}
