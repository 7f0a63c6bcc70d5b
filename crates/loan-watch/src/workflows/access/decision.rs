use axum::http::Method;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::context::RequestContext;
use super::verifier::CredentialVerifier;
use super::AccessFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessRole {
    Admin,
    Public,
    CorsPreflight,
}

impl AccessRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Public => "public",
            Self::CorsPreflight => "cors-preflight",
        }
    }
}

/// Gate outcome, serialized as `{authorized, context}`.
#[derive(Debug, Clone, Serialize)]
pub struct AccessDecision {
    pub authorized: bool,
    pub context: DecisionContext,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionContext {
    pub role: AccessRole,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_key: Option<String>,
    pub evaluated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AccessDecision {
    pub fn role(&self) -> AccessRole {
        self.context.role
    }

    pub fn reason(&self) -> &str {
        &self.context.reason
    }
}

/// Applies the gate rules in order; the first match wins.
///
/// 1. `OPTIONS` is a CORS preflight and always passes.
/// 2. `GET` is public.
/// 3. A credential accepted by `verifier` grants admin.
/// 4. Anything else is denied.
pub fn decide(
    context: &RequestContext,
    verifier: &dyn CredentialVerifier,
    evaluated_at: DateTime<Utc>,
) -> Result<AccessDecision, AccessFault> {
    let (authorized, role, reason) = if context.method == Method::OPTIONS {
        (true, AccessRole::CorsPreflight, "CORS preflight".to_string())
    } else if context.method == Method::GET {
        (true, AccessRole::Public, "read access is public".to_string())
    } else if verify(context, verifier)? {
        (true, AccessRole::Admin, "valid admin credential".to_string())
    } else {
        (
            false,
            AccessRole::Public,
            format!(
                "{} request without a valid admin credential",
                context.method
            ),
        )
    };

    Ok(AccessDecision {
        authorized,
        context: DecisionContext {
            role,
            reason,
            method: Some(context.method.to_string()),
            path: context.path.clone(),
            route_key: context.route_key.clone(),
            evaluated_at,
            error: None,
        },
    })
}

fn verify(
    context: &RequestContext,
    verifier: &dyn CredentialVerifier,
) -> Result<bool, AccessFault> {
    match &context.credential {
        Some(credential) => verifier.verify(credential),
        None => Ok(false),
    }
}

/// Decision used when evaluation itself failed: reads stay open, writes stay closed.
pub fn fail_safe(
    method: Option<String>,
    path: Option<String>,
    route_key: Option<String>,
    fault: &AccessFault,
    evaluated_at: DateTime<Utc>,
) -> AccessDecision {
    let authorized = method
        .as_deref()
        .map(|value| value.eq_ignore_ascii_case("GET"))
        .unwrap_or(false);
    let reason = if authorized {
        "access evaluation failed; read allowed".to_string()
    } else {
        "access evaluation failed; write denied".to_string()
    };

    AccessDecision {
        authorized,
        context: DecisionContext {
            role: AccessRole::Public,
            reason,
            method,
            path,
            route_key,
            evaluated_at,
            error: Some(fault.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::access::context::Credential;
    use crate::workflows::access::verifier::StaticTokenVerifier;

    fn context(method: Method, token: Option<&str>) -> RequestContext {
        RequestContext {
            method,
            path: Some("/api/v1/books".to_string()),
            route_key: None,
            credential: token.and_then(Credential::parse),
        }
    }

    fn verifier() -> StaticTokenVerifier {
        StaticTokenVerifier::new(Some("abc123".to_string()))
    }

    fn run(method: Method, token: Option<&str>) -> AccessDecision {
        decide(&context(method, token), &verifier(), Utc::now()).expect("decision")
    }

    #[test]
    fn options_is_always_preflight() {
        for token in [None, Some("abc123"), Some("wrong")] {
            let decision = run(Method::OPTIONS, token);
            assert!(decision.authorized);
            assert_eq!(decision.role(), AccessRole::CorsPreflight);
        }
    }

    #[test]
    fn get_is_public_without_token() {
        let decision = run(Method::GET, None);
        assert!(decision.authorized);
        assert_eq!(decision.role(), AccessRole::Public);
        assert_eq!(decision.reason(), "read access is public");
    }

    #[test]
    fn get_stays_public_even_with_admin_token() {
        let decision = run(Method::GET, Some("abc123"));
        assert!(decision.authorized);
        assert_eq!(decision.role(), AccessRole::Public);
    }

    #[test]
    fn admin_token_unlocks_writes() {
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            let decision = run(method, Some("abc123"));
            assert!(decision.authorized);
            assert_eq!(decision.role(), AccessRole::Admin);
        }
    }

    #[test]
    fn writes_without_valid_token_are_denied_naming_method() {
        for token in [None, Some("nope")] {
            let decision = run(Method::DELETE, token);
            assert!(!decision.authorized);
            assert_eq!(decision.role(), AccessRole::Public);
            assert!(decision.reason().contains("DELETE"));
        }
    }

    #[test]
    fn verifier_fault_propagates_to_caller() {
        let failing = |_: &Credential| -> Result<bool, AccessFault> {
            Err(AccessFault::VerifierUnavailable("introspection timeout".to_string()))
        };
        let result = decide(&context(Method::POST, Some("abc123")), &failing, Utc::now());
        assert!(matches!(result, Err(AccessFault::VerifierUnavailable(_))));
    }

    #[test]
    fn fail_safe_only_opens_reads() {
        let fault = AccessFault::MissingMethod;
        let read = fail_safe(Some("GET".to_string()), None, None, &fault, Utc::now());
        assert!(read.authorized);
        let write = fail_safe(Some("POST".to_string()), None, None, &fault, Utc::now());
        assert!(!write.authorized);
        let unknown = fail_safe(None, None, None, &fault, Utc::now());
        assert!(!unknown.authorized);
        assert!(unknown.context.error.is_some());
    }

    #[test]
    fn serializes_authorizer_shape() {
        let value = serde_json::to_value(run(Method::OPTIONS, None)).expect("serializes");
        assert_eq!(value["authorized"], true);
        assert_eq!(value["context"]["role"], "cors-preflight");
        assert_eq!(value["context"]["method"], "OPTIONS");
        assert!(value["context"].get("error").is_none());
    }
}
