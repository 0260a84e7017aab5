use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::domain::{ApplicationId, ApplicationSubmission, MatchingResult};
use super::orchestrator::CancellationFlag;
use super::repository::{PolicyRepository, RepositoryError, ResultStore};
use super::service::{MatchingService, MatchingServiceError};

/// Message returned for any failure the caller cannot fix.
pub const ENGINE_UNAVAILABLE: &str = "matching engine is temporarily unavailable";

pub const APPLICATION_ID_HEADER: &str = "x-application-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Envelope shared by every matching endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingResponse<T = Vec<MatchingResult>> {
    pub status: ResponseStatus,
    pub message: String,
    pub data: T,
}

impl<T> MatchingResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: String::new(),
            data,
        }
    }
}

impl MatchingResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: Vec::new(),
        }
    }
}

/// Router builder exposing the matching engine over HTTP.
pub fn matching_router<P, S>(service: Arc<MatchingService<P, S>>) -> Router
where
    P: PolicyRepository + 'static,
    S: ResultStore + 'static,
{
    Router::new()
        .route("/api/v1/matching-engine", post(match_handler::<P, S>))
        .route(
            "/api/v1/matching-engine/:application_id",
            get(results_handler::<P, S>),
        )
        .route("/api/v1/lender-policies", get(policies_handler::<P, S>))
        .with_state(service)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(MatchingResponse::error(message))).into_response()
}

fn unavailable() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, ENGINE_UNAVAILABLE)
}

pub(crate) async fn match_handler<P, S>(
    State(service): State<Arc<MatchingService<P, S>>>,
    payload: Result<Json<ApplicationSubmission>, JsonRejection>,
) -> Response
where
    P: PolicyRepository + 'static,
    S: ResultStore + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let application = match service.intake(submission) {
        Ok(application) => application,
        Err(MatchingServiceError::Validation(error)) => {
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        Err(other) => {
            error!(error = %other, "intake failed");
            return unavailable();
        }
    };

    // Dropping the request future drops this guard and stops the blocking run.
    let cancel = CancellationFlag::new();
    let _guard = cancel.cancel_on_drop();

    let application_id = application.application_id.clone();
    let worker = Arc::clone(&service);
    let outcome =
        tokio::task::spawn_blocking(move || worker.run(&application, &cancel)).await;

    match outcome {
        Ok(Ok(run)) if run.complete => (
            StatusCode::OK,
            [(APPLICATION_ID_HEADER, application_id.0)],
            Json(MatchingResponse::success(run.record.results)),
        )
            .into_response(),
        Ok(Ok(_)) => {
            warn!(application_id = %application_id, "matching run ended before completion");
            unavailable()
        }
        Ok(Err(MatchingServiceError::Validation(error))) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
        }
        Ok(Err(other)) => {
            error!(application_id = %application_id, error = %other, "matching run failed");
            unavailable()
        }
        Err(join_error) => {
            error!(application_id = %application_id, error = %join_error, "matching task panicked");
            unavailable()
        }
    }
}

pub(crate) async fn results_handler<P, S>(
    State(service): State<Arc<MatchingService<P, S>>>,
    Path(application_id): Path<String>,
) -> Response
where
    P: PolicyRepository + 'static,
    S: ResultStore + 'static,
{
    let id = ApplicationId(application_id);
    match service.results(&id) {
        Ok(record) => (
            StatusCode::OK,
            Json(MatchingResponse::success(record.results)),
        )
            .into_response(),
        Err(MatchingServiceError::Repository(RepositoryError::NotFound)) => error_response(
            StatusCode::NOT_FOUND,
            format!("no matching results for application {id}"),
        ),
        Err(other) => {
            error!(application_id = %id, error = %other, "result lookup failed");
            unavailable()
        }
    }
}

pub(crate) async fn policies_handler<P, S>(
    State(service): State<Arc<MatchingService<P, S>>>,
) -> Response
where
    P: PolicyRepository + 'static,
    S: ResultStore + 'static,
{
    match service.active_policies() {
        Ok(policies) => (StatusCode::OK, Json(MatchingResponse::success(policies))).into_response(),
        Err(other) => {
            error!(error = %other, "policy listing failed");
            unavailable()
        }
    }
}
