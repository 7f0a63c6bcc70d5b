use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use loan_watch::workflows::access::{access_router, AccessGate};
use loan_watch::workflows::loans::{
    loan_router, CatalogRepository, CatalogService, SharedAlertJob,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_loan_routes<R>(
    catalog: Arc<CatalogService<R>>,
    job: Arc<SharedAlertJob>,
    gate: Arc<AccessGate>,
) -> Router
where
    R: CatalogRepository + 'static,
{
    loan_router(catalog, job, gate.clone())
        .merge(access_router(gate))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
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
