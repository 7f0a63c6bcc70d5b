use std::collections::HashMap;
use std::fmt;

use axum::http::{header, HeaderMap, Method};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AccessFault;

/// Inbound authorizer payload in the HTTP API gateway shape.
///
/// Several fields carry the same fact (the method shows up in
/// `requestContext.http.method`, the `routeKey` prefix and the legacy
/// `httpMethod`); [`RequestContext::resolve`] folds them into one value.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerRequest {
    #[serde(default)]
    pub route_key: Option<String>,
    #[serde(default)]
    pub identity_source: Option<Vec<String>>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub request_context: Option<GatewayRequestContext>,
    #[serde(default)]
    pub http_method: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayRequestContext {
    #[serde(default)]
    pub http: Option<GatewayHttp>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GatewayHttp {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl AuthorizerRequest {
    fn context_method(&self) -> Option<&str> {
        self.request_context
            .as_ref()?
            .http
            .as_ref()?
            .method
            .as_deref()
    }

    fn context_path(&self) -> Option<&str> {
        self.request_context.as_ref()?.http.as_ref()?.path.as_deref()
    }

    fn route_key_method(&self) -> Option<&str> {
        self.route_key
            .as_deref()
            .and_then(|key| key.split_whitespace().next())
    }

    /// Method signals in precedence order, blanks dropped.
    fn method_signals(&self) -> Vec<&str> {
        [
            self.context_method(),
            self.route_key_method(),
            self.http_method.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .collect()
    }

    /// Highest-precedence method signal, used when full resolution fails.
    pub fn best_effort_method(&self) -> Option<String> {
        let signals = self.method_signals();
        if signals.iter().any(|signal| signal.eq_ignore_ascii_case("GET")) {
            return Some("GET".to_string());
        }
        signals.first().map(|value| value.to_ascii_uppercase())
    }

    fn presented_token(&self) -> Option<&str> {
        let from_identity = self
            .identity_source
            .as_ref()
            .and_then(|sources| sources.first())
            .map(String::as_str);

        let from_headers = || {
            self.headers.as_ref().and_then(|headers| {
                headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case("authorization"))
                    .map(|(_, value)| value.as_str())
            })
        };

        from_identity
            .filter(|value| !value.trim().is_empty())
            .or_else(from_headers)
    }
}

/// Presented bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Accepts a raw token or an `Authorization: Bearer <token>` value.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let token = match trimmed.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            None if trimmed.eq_ignore_ascii_case("bearer") => "",
            _ => trimmed,
        };
        if token.is_empty() {
            None
        } else {
            Some(Self(token.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Canonical view of one request, built once at the boundary.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: Option<String>,
    pub route_key: Option<String>,
    pub credential: Option<Credential>,
}

impl RequestContext {
    pub fn resolve(request: &AuthorizerRequest) -> Result<Self, AccessFault> {
        let signals = request.method_signals();
        let raw_method = signals.first().ok_or(AccessFault::MissingMethod)?;

        // A read announced by any signal is a read.
        let method = if signals.iter().any(|signal| signal.eq_ignore_ascii_case("GET")) {
            Method::GET
        } else {
            parse_method(raw_method)?
        };

        if signals
            .iter()
            .any(|other| !other.eq_ignore_ascii_case(method.as_str()))
        {
            warn!(%method, ?signals, "method signals disagree");
        }

        Ok(Self {
            method,
            path: request.context_path().map(str::to_string),
            route_key: request.route_key.clone(),
            credential: request.presented_token().and_then(Credential::parse),
        })
    }

    /// Builds the context for a request served directly by this process.
    pub fn from_http(
        method: &Method,
        path: &str,
        route_key: Option<String>,
        headers: &HeaderMap,
    ) -> Result<Self, AccessFault> {
        let credential = match headers.get(header::AUTHORIZATION) {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| AccessFault::UnreadableCredential)?;
                Credential::parse(raw)
            }
            None => None,
        };

        Ok(Self {
            method: method.clone(),
            path: Some(path.to_string()),
            route_key,
            credential,
        })
    }
}

fn parse_method(raw: &str) -> Result<Method, AccessFault> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
        .map_err(|_| AccessFault::InvalidMethod(raw.to_string()))
}
