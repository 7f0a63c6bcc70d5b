use subtle::ConstantTimeEq;

use super::context::Credential;
use super::AccessFault;

/// Decides whether a presented credential grants admin (write) access.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credential: &Credential) -> Result<bool, AccessFault>;
}

impl<F> CredentialVerifier for F
where
    F: Fn(&Credential) -> Result<bool, AccessFault> + Send + Sync,
{
    fn verify(&self, credential: &Credential) -> Result<bool, AccessFault> {
        self(credential)
    }
}

/// Compares against one shared secret from configuration.
///
/// With no secret configured every credential is rejected.
pub struct StaticTokenVerifier {
    expected: Option<String>,
}

impl StaticTokenVerifier {
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }
}

impl CredentialVerifier for StaticTokenVerifier {
    fn verify(&self, credential: &Credential) -> Result<bool, AccessFault> {
        let Some(expected) = self.expected.as_deref() else {
            return Ok(false);
        };
        Ok(bool::from(
            expected.as_bytes().ct_eq(credential.expose().as_bytes()),
        ))
    }
}
