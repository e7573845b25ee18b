use laurel_core::{AppResult, UserIdentity};

/// Verifies bearer credentials and produces the caller identity.
///
/// Invalid, expired or malformed credentials yield `AppError::Unauthorized`.
pub trait CredentialVerifier: Send + Sync {
    /// Verifies one bearer token.
    fn verify(&self, token: &str) -> AppResult<UserIdentity>;
}
