use crate::infra::{build_engine, offline_advisory_config, AppState, OfflineTransport, ProfileKind};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use riskgate::error::AppError;
use riskgate::screening::{
    screening_router, AdvisoryClient, AdvisoryTransport, CaseRepository, ReviewAlertPublisher,
    ScreeningService, SubmissionImporter,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct BatchScreeningRequest {
    #[serde(default)]
    pub(crate) profile: ProfileKind,
    pub(crate) dataset_csv: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchScreeningResponse {
    pub(crate) profile: &'static str,
    pub(crate) total: usize,
    pub(crate) decisions: BTreeMap<&'static str, usize>,
    pub(crate) rows: Vec<BatchRowView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchRowView {
    pub(crate) subject_reference: String,
    pub(crate) score: f64,
    pub(crate) risk_tier: &'static str,
    pub(crate) decision: &'static str,
    pub(crate) indicators: BTreeSet<String>,
}

pub(crate) fn with_screening_routes<R, A, T>(service: Arc<ScreeningService<R, A, T>>) -> axum::Router
where
    R: CaseRepository + 'static,
    A: ReviewAlertPublisher + 'static,
    T: AdvisoryTransport + 'static,
{
    screening_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/screenings/batch",
            axum::routing::post(batch_screening_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Rule-only preview over an uploaded CSV dataset. Nothing is stored and the
/// advisory model is never consulted, so the response is deterministic.
pub(crate) async fn batch_screening_endpoint(
    Json(payload): Json<BatchScreeningRequest>,
) -> Result<Json<BatchScreeningResponse>, AppError> {
    let BatchScreeningRequest {
        profile,
        dataset_csv,
    } = payload;

    let submissions = SubmissionImporter::from_reader(Cursor::new(dataset_csv.into_bytes()))?;
    let engine = build_engine(
        profile.load(),
        AdvisoryClient::new(offline_advisory_config(), OfflineTransport),
    )?;

    let mut decisions: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut rows = Vec::with_capacity(submissions.len());
    for submission in submissions {
        let verdict = engine.evaluate(&submission.features);
        *decisions.entry(verdict.decision.label()).or_insert(0) += 1;
        rows.push(BatchRowView {
            subject_reference: submission.subject_reference,
            score: verdict.score,
            risk_tier: verdict.risk_tier.label(),
            decision: verdict.decision.label(),
            indicators: verdict.indicators,
        });
    }

    Ok(Json(BatchScreeningResponse {
        profile: profile.label(),
        total: rows.len(),
        decisions,
        rows,
    }))
}
