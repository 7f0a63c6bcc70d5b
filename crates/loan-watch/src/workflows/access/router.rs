use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tracing::warn;

use super::context::AuthorizerRequest;
use super::decision::AccessDecision;
use super::gate::AccessGate;

/// Authorizer endpoint for an upstream gateway.
pub fn access_router(gate: Arc<AccessGate>) -> Router {
    Router::new()
        .route("/api/v1/authorize", post(authorize_handler))
        .with_state(gate)
}

/// Always answers with a decision; an unreadable payload is evaluated as an
/// empty request and therefore fails closed.
pub(crate) async fn authorize_handler(
    State(gate): State<Arc<AccessGate>>,
    body: Bytes,
) -> Json<AccessDecision> {
    let request = match serde_json::from_slice::<AuthorizerRequest>(&body) {
        Ok(request) => request,
        Err(err) => {
            warn!(error = %err, "unreadable authorizer payload");
            AuthorizerRequest::default()
        }
    };

    Json(gate.evaluate(&request))
}

/// Route layer applying the gate to requests served by this process.
pub async fn enforce_access(
    State(gate): State<Arc<AccessGate>>,
    request: Request,
    next: Next,
) -> Response {
    let route_key = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| format!("{} {}", request.method(), matched.as_str()));

    let decision = gate.evaluate_http(
        request.method(),
        request.uri().path(),
        route_key,
        request.headers(),
    );

    if decision.authorized {
        next.run(request).await
    } else {
        (StatusCode::FORBIDDEN, Json(decision)).into_response()
    }
}
