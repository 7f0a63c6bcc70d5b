//! Write gate for the catalog: reads are public, writes need an admin credential.

mod context;
mod decision;
mod gate;
pub mod router;
mod verifier;

pub use context::{AuthorizerRequest, Credential, GatewayHttp, GatewayRequestContext, RequestContext};
pub use decision::{decide, fail_safe, AccessDecision, AccessRole, DecisionContext};
pub use gate::AccessGate;
pub use router::{access_router, enforce_access};
pub use verifier::{CredentialVerifier, StaticTokenVerifier};

/// Failure while evaluating a request; recovered into a fail-safe decision.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessFault {
    #[error("request carries no method signal")]
    MissingMethod,
    #[error("invalid request method '{0}'")]
    InvalidMethod(String),
    #[error("authorization header is not valid visible ASCII")]
    UnreadableCredential,
    #[error("credential verifier unavailable: {0}")]
    VerifierUnavailable(String),
}
