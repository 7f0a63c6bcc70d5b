use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::catalog::{BookDraft, BookPatch, CatalogError, CatalogService};
use super::job::{JobResponse, SharedAlertJob};
use super::repository::CatalogRepository;
use crate::workflows::access::{enforce_access, AccessGate};

struct LoanRoutes<R> {
    catalog: Arc<CatalogService<R>>,
    job: Arc<SharedAlertJob>,
}

impl<R> Clone for LoanRoutes<R> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            job: self.job.clone(),
        }
    }
}

/// Catalog and alert-job endpoints, every route behind the access gate.
pub fn loan_router<R>(
    catalog: Arc<CatalogService<R>>,
    job: Arc<SharedAlertJob>,
    gate: Arc<AccessGate>,
) -> Router
where
    R: CatalogRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/books",
            get(list_handler::<R>)
                .post(create_handler::<R>)
                .options(preflight_handler),
        )
        .route(
            "/api/v1/books/:id",
            get(get_handler::<R>)
                .put(update_handler::<R>)
                .options(preflight_handler),
        )
        .route(
            "/api/v1/jobs/due-date-alerts",
            post(run_alert_job_handler::<R>).options(preflight_handler),
        )
        .route_layer(middleware::from_fn_with_state(gate, enforce_access))
        .with_state(LoanRoutes { catalog, job })
}

/// Reached only after the gate admits the preflight.
async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn list_handler<R>(State(routes): State<LoanRoutes<R>>) -> Response
where
    R: CatalogRepository + 'static,
{
    match routes.catalog.list() {
        Ok(books) => (StatusCode::OK, Json(books)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

async fn create_handler<R>(
    State(routes): State<LoanRoutes<R>>,
    Json(draft): Json<BookDraft>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    match routes.catalog.create(draft) {
        Ok(book) => (StatusCode::CREATED, Json(book)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

async fn get_handler<R>(
    State(routes): State<LoanRoutes<R>>,
    Path(id): Path<String>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    match routes.catalog.get(&id) {
        Ok(book) => (StatusCode::OK, Json(book)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

async fn update_handler<R>(
    State(routes): State<LoanRoutes<R>>,
    Path(id): Path<String>,
    Json(patch): Json<BookPatch>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    match routes.catalog.update(&id, patch) {
        Ok(book) => (StatusCode::OK, Json(book)).into_response(),
        Err(err) => catalog_error_response(err),
    }
}

fn catalog_error_response(err: CatalogError) -> Response {
    let status = match &err {
        CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
        CatalogError::NotFound => StatusCode::NOT_FOUND,
        CatalogError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

#[derive(Debug, Default, Deserialize)]
struct AlertJobQuery {
    #[serde(default)]
    today: Option<String>,
}

async fn run_alert_job_handler<R>(
    State(routes): State<LoanRoutes<R>>,
    Query(query): Query<AlertJobQuery>,
) -> Response
where
    R: CatalogRepository + 'static,
{
    let job = routes.job.as_ref();
    let now = Utc::now();

    let result = match query.today.as_deref().map(str::trim) {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(today) => job.run(today, now.with_timezone(&job.config().reference_offset)),
            Err(err) => {
                let payload = json!({
                    "error": format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"),
                });
                return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
            }
        },
        None => job.run_at(now),
    };

    let response = JobResponse::from(&result);
    let status =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response)).into_response()
}
