use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use super::advisory::AdvisoryTransport;
use super::domain::{CaseId, ScreeningSubmission};
use super::repository::{
    CaseRecord, CaseRepository, CaseStatusView, RepositoryError, ReviewAlertPublisher,
};
use super::service::{ScreeningService, ScreeningServiceError};

/// Cap on the pending-review listing.
const PENDING_REVIEW_LIMIT: usize = 50;

pub fn screening_router<R, A, T>(service: Arc<ScreeningService<R, A, T>>) -> Router
where
    R: CaseRepository + 'static,
    A: ReviewAlertPublisher + 'static,
    T: AdvisoryTransport + 'static,
{
    Router::new()
        .route("/api/v1/screenings", post(screen_handler::<R, A, T>))
        .route(
            "/api/v1/screenings/pending",
            get(pending_handler::<R, A, T>),
        )
        .route(
            "/api/v1/screenings/:case_id",
            get(status_handler::<R, A, T>),
        )
        .with_state(service)
}

/// Screening runs the blocking advisory client, so it is pushed off the
/// async worker onto the blocking pool.
pub(crate) async fn screen_handler<R, A, T>(
    State(service): State<Arc<ScreeningService<R, A, T>>>,
    Json(submission): Json<ScreeningSubmission>,
) -> Response
where
    R: CaseRepository + 'static,
    A: ReviewAlertPublisher + 'static,
    T: AdvisoryTransport + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || service.screen(submission)).await;

    match outcome {
        Ok(Ok(record)) => (StatusCode::CREATED, Json(record.status_view())).into_response(),
        Ok(Err(ScreeningServiceError::EmptySubjectReference)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "subject reference must not be empty" })),
        )
            .into_response(),
        Ok(Err(ScreeningServiceError::Repository(RepositoryError::Conflict))) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "case already exists" })),
        )
            .into_response(),
        Ok(Err(ScreeningServiceError::Repository(RepositoryError::Unavailable(_)))) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "case store unavailable" })),
        )
            .into_response(),
        Ok(Err(err)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "screening worker failed" })),
        )
            .into_response(),
    }
}

pub(crate) async fn status_handler<R, A, T>(
    State(service): State<Arc<ScreeningService<R, A, T>>>,
    Path(case_id): Path<String>,
) -> Response
where
    R: CaseRepository + 'static,
    A: ReviewAlertPublisher + 'static,
    T: AdvisoryTransport + 'static,
{
    match service.get(&CaseId(case_id)) {
        Ok(record) => (StatusCode::OK, Json(record.status_view())).into_response(),
        Err(ScreeningServiceError::Repository(RepositoryError::NotFound)) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "case not found" })),
        )
            .into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}

pub(crate) async fn pending_handler<R, A, T>(
    State(service): State<Arc<ScreeningService<R, A, T>>>,
) -> Response
where
    R: CaseRepository + 'static,
    A: ReviewAlertPublisher + 'static,
    T: AdvisoryTransport + 'static,
{
    match service.pending_review(PENDING_REVIEW_LIMIT) {
        Ok(records) => {
            let views: Vec<CaseStatusView> =
                records.iter().map(CaseRecord::status_view).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
    }
}
