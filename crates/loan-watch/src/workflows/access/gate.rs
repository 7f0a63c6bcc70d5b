use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use chrono::Utc;
use tracing::{error, info};

use super::context::{AuthorizerRequest, RequestContext};
use super::decision::{decide, fail_safe, AccessDecision};
use super::verifier::CredentialVerifier;
use super::AccessFault;

/// Per-request access policy. Holds no request state; every call decides afresh.
#[derive(Clone)]
pub struct AccessGate {
    verifier: Arc<dyn CredentialVerifier>,
}

impl AccessGate {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    /// Evaluates an authorizer payload. Always yields a decision.
    pub fn evaluate(&self, request: &AuthorizerRequest) -> AccessDecision {
        let evaluated_at = Utc::now();
        let outcome = RequestContext::resolve(request)
            .and_then(|context| decide(&context, self.verifier.as_ref(), evaluated_at));

        match outcome {
            Ok(decision) => log_decision(decision),
            Err(fault) => {
                let path = request
                    .request_context
                    .as_ref()
                    .and_then(|ctx| ctx.http.as_ref())
                    .and_then(|http| http.path.clone());
                recover(
                    fail_safe(
                        request.best_effort_method(),
                        path,
                        request.route_key.clone(),
                        &fault,
                        evaluated_at,
                    ),
                    &fault,
                )
            }
        }
    }

    /// Evaluates a request served by this process.
    pub fn evaluate_http(
        &self,
        method: &Method,
        path: &str,
        route_key: Option<String>,
        headers: &HeaderMap,
    ) -> AccessDecision {
        let evaluated_at = Utc::now();
        let outcome = RequestContext::from_http(method, path, route_key.clone(), headers)
            .and_then(|context| decide(&context, self.verifier.as_ref(), evaluated_at));

        match outcome {
            Ok(decision) => log_decision(decision),
            Err(fault) => recover(
                fail_safe(
                    Some(method.to_string()),
                    Some(path.to_string()),
                    route_key,
                    &fault,
                    evaluated_at,
                ),
                &fault,
            ),
        }
    }
}

fn log_decision(decision: AccessDecision) -> AccessDecision {
    info!(
        authorized = decision.authorized,
        role = decision.role().label(),
        method = decision.context.method.as_deref().unwrap_or("-"),
        route_key = decision.context.route_key.as_deref().unwrap_or("-"),
        reason = %decision.context.reason,
        "access decision"
    );
    decision
}

fn recover(decision: AccessDecision, fault: &AccessFault) -> AccessDecision {
    error!(
        error = %fault,
        authorized = decision.authorized,
        method = decision.context.method.as_deref().unwrap_or("-"),
        "access evaluation fault; applying fail-safe decision"
    );
    decision
}
